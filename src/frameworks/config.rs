use std::{env, net::IpAddr, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("ARENA_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn bind_addr() -> IpAddr {
    env::var("ARENA_BIND_ADDR")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::from([127, 0, 0, 1]))
}

pub fn tick_interval() -> Duration {
    let millis = env::var("ARENA_TICK_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .unwrap_or(50);
    Duration::from_millis(millis)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const BULLETS_BROADCAST_CAPACITY: usize = 128;
// Per-connection queue for discrete events; overflowing it drops the connection.
pub const OUTBOUND_CHANNEL_CAPACITY: usize = 256;
