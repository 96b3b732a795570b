//! Member contract and declared symbol surface.
//!
//! # Responsibility
//! - Replace runtime reflection with an explicit, declared symbol surface.
//! - Provide side-effect-free attribute reads and explicit method calls.
//!
//! # Invariants
//! - `get_attr` never mutates the member.
//! - Every name returned by `symbols()` should also answer `get_attr`.

use crate::model::value::Value;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Default prefix marking a symbol as private by naming convention.
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// Private-naming rule shared by descriptors and delegated names.
///
/// An empty prefix marks nothing as private.
pub fn is_private_name(name: &str, prefix: &str) -> bool {
    !prefix.is_empty() && name.starts_with(prefix)
}

/// Kind of one declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// Callable through `Member::invoke`.
    Method,
    /// Plain data read through `Member::get_attr`.
    Property,
    /// Nested member object.
    Object,
}

/// One entry of a member's declared surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolDescriptor {
    pub name: String,
    pub kind: SymbolKind,
}

impl SymbolDescriptor {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn method(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Method)
    }

    pub fn property(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Property)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Object)
    }

    /// Returns whether the name is private under `prefix`.
    pub fn is_private(&self, prefix: &str) -> bool {
        is_private_name(&self.name, prefix)
    }

    pub fn is_callable(&self) -> bool {
        self.kind == SymbolKind::Method
    }
}

/// Result of reading one attribute from a member.
///
/// Methods are only markers here; calling goes through `Member::invoke` so
/// the owning member stays in charge of its own state.
#[derive(Clone)]
pub enum Attr {
    Value(Value),
    Method,
    Object(Arc<dyn Member>),
}

impl Attr {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Self::Value(_) => SymbolKind::Property,
            Self::Method => SymbolKind::Method,
            Self::Object(_) => SymbolKind::Object,
        }
    }

    /// Methods and objects always count as present.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Value(value) => value.is_truthy(),
            Self::Method | Self::Object(_) => true,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Member>> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl Debug for Attr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Method => f.write_str("Method"),
            Self::Object(object) => {
                let names: Vec<String> = object
                    .symbols()
                    .into_iter()
                    .map(|symbol| symbol.name)
                    .collect();
                f.debug_tuple("Object").field(&names).finish()
            }
        }
    }
}

/// Object that can act as a delegation source.
///
/// Implementations declare their public surface in `symbols()` instead of
/// being inspected at runtime.
pub trait Member: Send + Sync {
    /// Declared surface, including private names.
    fn symbols(&self) -> Vec<SymbolDescriptor>;

    /// Reads one attribute by name.
    fn get_attr(&self, name: &str) -> Option<Attr>;

    /// Calls one method by name.
    fn invoke(&self, name: &str, _args: &[Value]) -> Result<Value, InvokeError> {
        Err(InvokeError::NotCallable(name.to_string()))
    }
}

/// Method call failures reported by members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    NotCallable(String),
    UnknownMethod(String),
    InvalidArguments { method: String, message: String },
}

impl InvokeError {
    pub fn invalid_arguments(method: &str, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            method: method.to_string(),
            message: message.into(),
        }
    }
}

impl Display for InvokeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotCallable(name) => write!(f, "attribute is not callable: {name}"),
            Self::UnknownMethod(name) => write!(f, "unknown method: {name}"),
            Self::InvalidArguments { method, message } => {
                write!(f, "invalid arguments for `{method}`: {message}")
            }
        }
    }
}

impl Error for InvokeError {}
