//! Attribute delegation core.
//! Hosts expose selected symbols of their member objects as their own,
//! resolved through a per-host registry on lookup miss.

pub mod config;
pub mod host;
pub mod logging;
pub mod model;
pub mod registry;

pub use config::{ConfigError, RegistryOptions, WritePolicy};
pub use host::{DelegationSnapshot, Delegator};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::member::{Attr, InvokeError, Member, SymbolDescriptor, SymbolKind};
pub use model::value::Value;
pub use registry::{
    DelegationBatch, DelegationError, DelegationMap, DelegationRegistry, DelegationResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
