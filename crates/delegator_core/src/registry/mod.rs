//! Delegation registry and its error taxonomy.
//!
//! # Responsibility
//! - Track which member owns which delegated symbol.
//! - Enforce symbol uniqueness and cascade removals through nested owners.
//!
//! # Invariants
//! - A symbol name appears at most once across the whole mapping.
//! - Rejected mutations leave the mapping untouched.
//! - The flattened symbol set is always derived, never stored.

use crate::model::member::InvokeError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod delegation_registry;

pub use delegation_registry::{DelegationBatch, DelegationMap, DelegationRegistry};

pub type DelegationResult<T> = Result<T, DelegationError>;

/// Delegation mutation and resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationError {
    /// Symbol repeated inside one batch or already delegated.
    DuplicateSymbol(String),
    /// Member missing on the host, or symbol missing/falsy on the member.
    UnknownAttribute { member: String, symbol: String },
    /// Member does not resolve to an object on the host.
    UnknownMember(String),
    /// No member delegates the requested symbol.
    UnresolvedSymbol(String),
    ResolutionDepthExceeded { symbol: String, limit: usize },
    Invoke(InvokeError),
}

impl Display for DelegationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateSymbol(symbol) => {
                write!(f, "cannot delegate two members with the same name: {symbol}")
            }
            Self::UnknownAttribute { member, symbol } => {
                write!(f, "'{member}' object has no attribute '{symbol}'")
            }
            Self::UnknownMember(member) => write!(f, "host has no member object '{member}'"),
            Self::UnresolvedSymbol(symbol) => write!(f, "attribute not found: {symbol}"),
            Self::ResolutionDepthExceeded { symbol, limit } => write!(
                f,
                "resolving `{symbol}` exceeded the delegation depth limit of {limit}"
            ),
            Self::Invoke(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DelegationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invoke(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvokeError> for DelegationError {
    fn from(value: InvokeError) -> Self {
        Self::Invoke(value)
    }
}
