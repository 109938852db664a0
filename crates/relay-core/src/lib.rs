//! # relay-core
//!
//! Keyed receiver registry: receivers are registered against arbitrary keys and
//! every receiver under a key is notified, synchronously, when an event is fired
//! for that key.
//!
//! ## Features
//!
//! - **Registry**: Concurrent map of key to receiver set, identity-based membership
//! - **Dispatch**: Snapshot-then-notify with per-receiver failure isolation
//! - **Diagnostics**: Pluggable sink for debug records of every fired event
//! - **Conversion**: Decoders turning raw payloads into typed data for receivers
//! - **Resources**: Abstraction over acquirable backing resources (connection pools)
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use relay_core::{FnReceiver, ReceiverRegistry, RegistryConfig};
//!
//! let registry: ReceiverRegistry<String, String> =
//!     ReceiverRegistry::new(RegistryConfig::default());
//!
//! let printer = Arc::new(FnReceiver::new(|key: &String, data: &String| {
//!     println!("{key}: {data}");
//!     Ok(())
//! }));
//! registry.register_receiver("chat".to_string(), printer);
//!
//! let report = registry.fire_event(&"chat".to_string(), &"hello".to_string());
//! assert_eq!(report.delivered(), 1);
//! ```

pub mod convert;
pub mod diagnostics;
pub mod error;
pub mod receiver;
pub mod registry;
pub mod resource;

// Re-export registry types
pub use registry::{DispatchReport, ReceiverRegistry, RegistryConfig};

// Re-export receiver types
pub use receiver::{FnReceiver, KeyedReceiver, ReceiverId};

// Re-export diagnostics types
pub use diagnostics::{DiagnosticRecord, DiagnosticSink, MemorySink, TracingSink};

// Re-export conversion types
pub use convert::{json_receiver, Decoder, DecodingReceiver, JsonDecoder};

// Re-export error types
pub use error::{
    DecodeError, DispatchError, FailureReason, ReceiveError, ReceiveResult, ReceiverFailure,
};

// Re-export resource types
pub use resource::ResourcePool;
