use crate::use_cases::Dispatch;

// Port for delivering discrete events to connections, implemented by the network adapter.
//
// Called from inside the world task, so implementations must not block.
pub trait Outbox: Send + Sync {
    fn deliver(&self, dispatch: Dispatch);
}
