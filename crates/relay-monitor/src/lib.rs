//! # relay-monitor
//!
//! Subscribes to a set of Redis channels and logs every message received,
//! which makes it handy for watching live traffic between services.

mod logger;
mod monitor;

pub use logger::ChannelLogger;
pub use monitor::{run, MonitorError};
