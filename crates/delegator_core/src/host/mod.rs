//! Delegating host surface.
//!
//! # Responsibility
//! - Pair a native host object with its own delegation registry.
//! - Route attribute misses and method calls into delegated members.
//!
//! # Invariants
//! - Every `Delegator` owns a fresh registry; state is never shared between hosts.

mod delegator;

pub use delegator::{DelegationSnapshot, Delegator};
