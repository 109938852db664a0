//! Keyed receiver registry.
//!
//! Holds, per key, a set of receivers and dispatches fired events to them.

mod config;
mod receiver_registry;
mod report;

pub use config::RegistryConfig;
pub use receiver_registry::ReceiverRegistry;
pub use report::DispatchReport;
