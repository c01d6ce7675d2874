use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out connection ids. Ids start at 1 and are never reused within a process, so a late
/// command from a closed connection cannot land on a newer player.
#[derive(Debug)]
pub struct ConnectionIds {
    next: AtomicU64,
}

impl Default for ConnectionIds {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }
}

impl ConnectionIds {
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
