//! Member model shared by the registry and the delegating host.
//!
//! # Responsibility
//! - Define the value, symbol and member contracts delegation works over.
//! - Keep member surfaces declared up front rather than discovered by reflection.
//!
//! # Invariants
//! - Attribute reads are side-effect free.
//! - Method calls always go through the owning member.

pub mod member;
pub mod value;
