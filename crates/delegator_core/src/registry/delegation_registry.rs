//! Owner-to-symbols mapping with uniqueness checks and cascading removal.

use crate::registry::{DelegationError, DelegationResult};
use std::collections::{BTreeMap, BTreeSet};

/// Member name to ordered delegated symbol names.
pub type DelegationMap = BTreeMap<String, Vec<String>>;

/// Incoming delegation request, kept in caller order.
///
/// Repeated member keys are folded into one entry; repeated symbols are kept
/// so uniqueness validation can reject them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelegationBatch {
    entries: Vec<(String, Vec<String>)>,
}

impl DelegationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends symbols for one member.
    pub fn push<S>(&mut self, member: impl Into<String>, symbols: impl IntoIterator<Item = S>)
    where
        S: Into<String>,
    {
        let member = member.into();
        let symbols = symbols.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(name, _)| *name == member) {
            Some((_, existing)) => existing.extend(symbols),
            None => self.entries.push((member, symbols.collect())),
        }
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    /// Iterates `(member, symbol)` pairs in caller order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().flat_map(|(member, symbols)| {
            symbols
                .iter()
                .map(move |symbol| (member.as_str(), symbol.as_str()))
        })
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(|(_, symbol)| symbol)
    }

    pub fn member_count(&self) -> usize {
        self.entries.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.entries.iter().map(|(_, symbols)| symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.symbol_count() == 0
    }
}

impl<K, V, S> FromIterator<(K, V)> for DelegationBatch
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut batch = Self::new();
        for (member, symbols) in iter {
            batch.push(member, symbols);
        }
        batch
    }
}

/// Instance-scoped delegation state.
///
/// Holds no host reference: attribute validation and resolution against the
/// object graph live in `host::Delegator`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelegationRegistry {
    delegations: DelegationMap,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current mapping, read-only.
    pub fn delegations(&self) -> &DelegationMap {
        &self.delegations
    }

    /// Number of members with delegated symbols.
    pub fn len(&self) -> usize {
        self.delegations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegations.is_empty()
    }

    pub fn contains_member(&self, member: &str) -> bool {
        self.delegations.contains_key(member)
    }

    pub fn contains_symbol(&self, symbol: &str) -> bool {
        self.owner_of(symbol).is_some()
    }

    /// Returns the member that delegates `symbol`.
    pub fn owner_of(&self, symbol: &str) -> Option<&str> {
        self.delegations
            .iter()
            .find(|(_, symbols)| symbols.iter().any(|candidate| candidate == symbol))
            .map(|(member, _)| member.as_str())
    }

    /// Flattened delegated symbols, in member order.
    pub fn all_symbols(&self) -> Vec<&str> {
        self.delegations
            .values()
            .flat_map(|symbols| symbols.iter().map(String::as_str))
            .collect()
    }

    /// Rejects symbols repeated in `batch`, and, when `against_existing` is
    /// set, symbols already delegated.
    pub fn check_unique(
        &self,
        batch: &DelegationBatch,
        against_existing: bool,
    ) -> DelegationResult<()> {
        let mut seen = BTreeSet::new();
        for symbol in batch.symbols() {
            if !seen.insert(symbol) {
                return Err(DelegationError::DuplicateSymbol(symbol.to_string()));
            }
        }

        if against_existing {
            let existing: BTreeSet<&str> = self.all_symbols().into_iter().collect();
            if let Some(symbol) = seen.iter().find(|symbol| existing.contains(*symbol)) {
                return Err(DelegationError::DuplicateSymbol(symbol.to_string()));
            }
        }
        Ok(())
    }

    /// Appends batch symbols under their members. Callers validate first.
    pub fn merge(&mut self, batch: DelegationBatch) {
        for (member, symbols) in batch.entries {
            if symbols.is_empty() {
                continue;
            }
            self.delegations.entry(member).or_default().extend(symbols);
        }
    }

    /// Replaces the whole mapping with `batch`.
    pub fn replace(&mut self, batch: DelegationBatch) {
        self.delegations.clear();
        self.merge(batch);
    }

    /// Removes `member` and, depth-first, every entry keyed by one of its
    /// symbols.
    ///
    /// Returns removed member keys with nested owners before their parents.
    /// Unknown members are a no-op.
    pub fn remove_for_member(&mut self, member: &str) -> Vec<String> {
        let mut removed = Vec::new();
        self.remove_recursive(member, &mut removed);
        removed
    }

    fn remove_recursive(&mut self, member: &str, removed: &mut Vec<String>) {
        // Detach before descending so self-referencing entries terminate.
        let Some(symbols) = self.delegations.remove(member) else {
            return;
        };
        for symbol in &symbols {
            if self.delegations.contains_key(symbol.as_str()) {
                self.remove_recursive(symbol, removed);
            }
        }
        removed.push(member.to_string());
    }

    /// Drops every delegation and returns how many members were cleared.
    pub fn clear(&mut self) -> usize {
        let count = self.delegations.len();
        self.delegations.clear();
        count
    }
}
