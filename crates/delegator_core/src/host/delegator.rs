//! Delegating host wrapper.
//!
//! # Responsibility
//! - Own one host object and its private delegation registry.
//! - Validate delegation requests against the live member graph.
//! - Resolve attribute misses and method calls through delegated members.
//!
//! # Invariants
//! - Native host attributes always win; the registry is consulted on miss only.
//! - A rejected `set_delegations` leaves the registry unchanged.
//! - Nested lookups stop at `RegistryOptions::max_resolution_depth`.

use crate::config::{ConfigError, RegistryOptions};
use crate::logging::sanitize_for_log;
use crate::model::member::{
    is_private_name, Attr, InvokeError, Member, SymbolDescriptor, SymbolKind,
};
use crate::model::value::Value;
use crate::registry::{
    DelegationBatch, DelegationError, DelegationMap, DelegationRegistry, DelegationResult,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use uuid::Uuid;

/// Owned copy of one host's delegations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelegationSnapshot {
    pub host_id: Uuid,
    pub delegations: DelegationMap,
}

/// Host object plus the delegation state it owns.
///
/// `Delegator` is itself a `Member`, so a delegator can be registered as a
/// member of another delegator and its delegated symbols re-exposed there.
pub struct Delegator<H> {
    id: Uuid,
    host: H,
    registry: DelegationRegistry,
    options: RegistryOptions,
}

impl<H: Member> Delegator<H> {
    /// Wraps `host` with an empty registry and default options.
    pub fn new(host: H) -> Self {
        Self::build(host, RegistryOptions::default())
    }

    /// Wraps `host` with caller-supplied options.
    ///
    /// # Errors
    /// Returns the `RegistryOptions::validate()` error for out-of-range options.
    pub fn with_options(host: H, options: RegistryOptions) -> Result<Self, ConfigError> {
        options.validate()?;
        Ok(Self::build(host, options))
    }

    fn build(host: H, options: RegistryOptions) -> Self {
        let id = Uuid::new_v4();
        debug!(
            "event=delegator_created module=host status=ok host_id={} policy={:?}",
            id, options.write_policy
        );
        Self {
            id,
            host,
            registry: DelegationRegistry::new(),
            options,
        }
    }

    /// Instance id used to correlate log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access. Registrations are not revalidated afterwards.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    pub fn registry(&self) -> &DelegationRegistry {
        &self.registry
    }

    /// Registers delegated symbols per member.
    ///
    /// # Errors
    /// - `DuplicateSymbol` when a symbol repeats in the batch or is already
    ///   delegated.
    /// - `UnknownAttribute` when a member is missing on the host or a symbol
    ///   is missing/falsy on its member.
    pub fn set_delegations<I, K, V, S>(&mut self, batch: I) -> DelegationResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.apply_batch(batch.into_iter().collect())
    }

    /// Validates and applies one prepared batch, all-or-nothing.
    pub fn apply_batch(&mut self, batch: DelegationBatch) -> DelegationResult<()> {
        if let Err(err) = self.validate_batch(&batch) {
            warn!(
                "event=delegations_rejected module=host status=error host_id={} reason={}",
                self.id,
                sanitize_for_log(&err.to_string())
            );
            return Err(err);
        }

        for symbol in batch.symbols() {
            if self.host.get_attr(symbol).is_some() {
                warn!(
                    "event=delegation_shadowed module=host status=ok host_id={} symbol={}",
                    self.id,
                    sanitize_for_log(symbol)
                );
            }
        }

        let members = batch.member_count();
        let symbols = batch.symbol_count();
        if self.options.merges() {
            self.registry.merge(batch);
        } else {
            self.registry.replace(batch);
        }
        info!(
            "event=delegations_set module=host status=ok host_id={} members={} symbols={} policy={:?}",
            self.id, members, symbols, self.options.write_policy
        );
        Ok(())
    }

    fn validate_batch(&self, batch: &DelegationBatch) -> DelegationResult<()> {
        self.registry.check_unique(batch, self.options.merges())?;

        for (member, symbol) in batch.pairs() {
            let unknown = || DelegationError::UnknownAttribute {
                member: member.to_string(),
                symbol: symbol.to_string(),
            };
            let object = match self.lookup(member, 0) {
                Ok(Attr::Object(object)) => object,
                Err(err @ DelegationError::ResolutionDepthExceeded { .. }) => return Err(err),
                Ok(_) | Err(_) => return Err(unknown()),
            };
            match object.get_attr(symbol) {
                Some(attr) if attr.is_truthy() => {}
                _ => return Err(unknown()),
            }
        }
        Ok(())
    }

    /// Current member to symbols mapping.
    pub fn delegations(&self) -> &DelegationMap {
        self.registry.delegations()
    }

    pub fn snapshot(&self) -> DelegationSnapshot {
        DelegationSnapshot {
            host_id: self.id,
            delegations: self.registry.delegations().clone(),
        }
    }

    /// Removes `member`'s delegations and every nested delegation chained
    /// through them. Returns removed member keys, nested owners first.
    pub fn remove_for_member(&mut self, member: &str) -> Vec<String> {
        let removed = self.registry.remove_for_member(member);
        if !removed.is_empty() {
            info!(
                "event=delegations_removed module=host status=ok host_id={} member={} removed={}",
                self.id,
                sanitize_for_log(member),
                removed.len()
            );
        }
        removed
    }

    pub fn clear_all(&mut self) {
        let cleared = self.registry.clear();
        info!(
            "event=delegations_cleared module=host status=ok host_id={} members={}",
            self.id, cleared
        );
    }

    /// Reads `name` from the host, falling back to delegated members.
    pub fn get(&self, name: &str) -> DelegationResult<Attr> {
        self.lookup(name, 0)
    }

    /// Registry fallback only: resolves `symbol` through its delegating
    /// member without checking the host's own attributes.
    pub fn resolve(&self, symbol: &str) -> DelegationResult<Attr> {
        self.resolve_at(symbol, 0)
    }

    /// Calls `name` on the host, or on the member that delegates it.
    pub fn invoke(&self, name: &str, args: &[Value]) -> DelegationResult<Value> {
        if let Some(attr) = self.host.get_attr(name) {
            return match attr {
                Attr::Method => Ok(self.host.invoke(name, args)?),
                _ => Err(InvokeError::NotCallable(name.to_string()).into()),
            };
        }

        let (member, object) = self.owning_object(name, 0)?;
        match object.get_attr(name) {
            Some(Attr::Method) => Ok(object.invoke(name, args)?),
            Some(_) => Err(InvokeError::NotCallable(name.to_string()).into()),
            None => Err(DelegationError::UnknownAttribute {
                member: member.to_string(),
                symbol: name.to_string(),
            }),
        }
    }

    fn lookup(&self, name: &str, depth: usize) -> DelegationResult<Attr> {
        if let Some(attr) = self.host.get_attr(name) {
            return Ok(attr);
        }
        self.resolve_at(name, depth)
    }

    fn resolve_at(&self, symbol: &str, depth: usize) -> DelegationResult<Attr> {
        let (member, object) = self.owning_object(symbol, depth)?;
        object
            .get_attr(symbol)
            .ok_or_else(|| DelegationError::UnknownAttribute {
                member: member.to_string(),
                symbol: symbol.to_string(),
            })
    }

    fn owning_object(
        &self,
        symbol: &str,
        depth: usize,
    ) -> DelegationResult<(&str, Arc<dyn Member>)> {
        if depth >= self.options.max_resolution_depth {
            return Err(DelegationError::ResolutionDepthExceeded {
                symbol: symbol.to_string(),
                limit: self.options.max_resolution_depth,
            });
        }
        let member = self
            .registry
            .owner_of(symbol)
            .ok_or_else(|| DelegationError::UnresolvedSymbol(symbol.to_string()))?;

        let stale = || DelegationError::UnknownAttribute {
            member: member.to_string(),
            symbol: symbol.to_string(),
        };
        match self.lookup(member, depth + 1) {
            Ok(Attr::Object(object)) => Ok((member, object)),
            Ok(_) | Err(DelegationError::UnresolvedSymbol(_)) => Err(stale()),
            Err(err) => Err(err),
        }
    }

    /// Host names a caller could pick as delegation sources: public,
    /// non-callable native symbols plus non-callable delegated symbols.
    pub fn candidate_members(&self) -> Vec<String> {
        let prefix = self.options.private_prefix.as_str();
        let mut names: BTreeSet<String> = self
            .host
            .symbols()
            .into_iter()
            .filter(|symbol| !symbol.is_private(prefix) && !symbol.is_callable())
            .map(|symbol| symbol.name)
            .collect();

        for symbol in self.registry.all_symbols() {
            if is_private_name(symbol, prefix) || names.contains(symbol) {
                continue;
            }
            if let Ok(attr) = self.resolve(symbol) {
                if attr.kind() != SymbolKind::Method {
                    names.insert(symbol.to_string());
                }
            }
        }
        names.into_iter().collect()
    }

    /// Public, truthy symbols per member.
    ///
    /// With `Some(member)` the map holds that member only; with `None` it
    /// covers every candidate member, non-object candidates mapping to an
    /// empty list.
    pub fn delegatable_symbols(
        &self,
        member: Option<&str>,
    ) -> DelegationResult<BTreeMap<String, Vec<String>>> {
        if let Some(member) = member {
            let object = self.member_object(member)?;
            let symbols = self.public_truthy_symbols(object.as_ref());
            return Ok(BTreeMap::from([(member.to_string(), symbols)]));
        }

        Ok(self
            .candidate_members()
            .into_iter()
            .map(|member| {
                let symbols = match self.get(&member) {
                    Ok(Attr::Object(object)) => self.public_truthy_symbols(object.as_ref()),
                    _ => vec![],
                };
                (member, symbols)
            })
            .collect())
    }

    /// Native symbols plus every delegated symbol, sorted and deduplicated.
    pub fn merged_symbols(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .host
            .symbols()
            .into_iter()
            .map(|symbol| symbol.name)
            .collect();
        names.extend(
            self.registry
                .all_symbols()
                .into_iter()
                .map(str::to_string),
        );
        names.into_iter().collect()
    }

    /// Delegates every public method of `member` not yet delegated.
    ///
    /// Returns the newly delegated method names.
    pub fn delegate_methods(&mut self, member: &str) -> DelegationResult<Vec<String>> {
        let object = self.member_object(member)?;
        let prefix = self.options.private_prefix.as_str();
        let methods: Vec<String> = object
            .symbols()
            .into_iter()
            .filter(|symbol| symbol.is_callable() && !symbol.is_private(prefix))
            .filter(|symbol| !self.registry.contains_symbol(&symbol.name))
            .map(|symbol| symbol.name)
            .collect();
        if methods.is_empty() {
            return Ok(methods);
        }

        let mut batch = DelegationBatch::new();
        batch.push(member, methods.iter().cloned());
        self.apply_batch(batch)?;
        Ok(methods)
    }

    fn member_object(&self, member: &str) -> DelegationResult<Arc<dyn Member>> {
        match self.get(member) {
            Ok(Attr::Object(object)) => Ok(object),
            Err(err @ DelegationError::ResolutionDepthExceeded { .. }) => Err(err),
            Ok(_) | Err(_) => Err(DelegationError::UnknownMember(member.to_string())),
        }
    }

    fn public_truthy_symbols(&self, object: &dyn Member) -> Vec<String> {
        let prefix = self.options.private_prefix.as_str();
        let names: BTreeSet<String> = object
            .symbols()
            .into_iter()
            .filter(|symbol| !symbol.is_private(prefix))
            .filter(|symbol| {
                object
                    .get_attr(&symbol.name)
                    .is_some_and(|attr| attr.is_truthy())
            })
            .map(|symbol| symbol.name)
            .collect();
        names.into_iter().collect()
    }
}

impl<H: Member> Member for Delegator<H> {
    fn symbols(&self) -> Vec<SymbolDescriptor> {
        let mut symbols = self.host.symbols();
        for name in self.registry.all_symbols() {
            if symbols.iter().any(|symbol| symbol.name == name) {
                continue;
            }
            if let Ok(attr) = self.resolve(name) {
                symbols.push(SymbolDescriptor::new(name, attr.kind()));
            }
        }
        symbols
    }

    fn get_attr(&self, name: &str) -> Option<Attr> {
        self.get(name).ok()
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, InvokeError> {
        Delegator::<H>::invoke(self, name, args).map_err(|err| match err {
            DelegationError::Invoke(inner) => inner,
            _ => InvokeError::UnknownMethod(name.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Delegator;
    use crate::config::{ConfigError, RegistryOptions, WritePolicy};
    use crate::model::member::{Attr, InvokeError, Member, SymbolDescriptor};
    use crate::model::value::Value;
    use crate::registry::DelegationError;
    use std::sync::Arc;

    struct Leaf;

    impl Member for Leaf {
        fn symbols(&self) -> Vec<SymbolDescriptor> {
            vec![
                SymbolDescriptor::property("depth"),
                SymbolDescriptor::property("empty"),
                SymbolDescriptor::method("echo"),
                SymbolDescriptor::property("größe"),
            ]
        }

        fn get_attr(&self, name: &str) -> Option<Attr> {
            match name {
                "depth" => Some(Attr::Value(Value::Int(2))),
                "empty" => Some(Attr::Value(Value::Str(String::new()))),
                "echo" => Some(Attr::Method),
                "größe" => Some(Attr::Value(Value::Int(3))),
                _ => None,
            }
        }

        fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, InvokeError> {
            match name {
                "echo" => Ok(args.first().cloned().unwrap_or(Value::Null)),
                _ => Err(InvokeError::UnknownMethod(name.to_string())),
            }
        }
    }

    struct Middle {
        inner: Arc<Leaf>,
    }

    impl Member for Middle {
        fn symbols(&self) -> Vec<SymbolDescriptor> {
            vec![SymbolDescriptor::object("inner")]
        }

        fn get_attr(&self, name: &str) -> Option<Attr> {
            match name {
                "inner" => Some(Attr::Object(self.inner.clone())),
                _ => None,
            }
        }
    }

    struct Root {
        outer: Arc<Middle>,
    }

    impl Member for Root {
        fn symbols(&self) -> Vec<SymbolDescriptor> {
            vec![
                SymbolDescriptor::object("outer"),
                SymbolDescriptor::property("depth"),
            ]
        }

        fn get_attr(&self, name: &str) -> Option<Attr> {
            match name {
                "outer" => Some(Attr::Object(self.outer.clone())),
                "depth" => Some(Attr::Value(Value::Int(0))),
                _ => None,
            }
        }
    }

    fn root() -> Root {
        Root {
            outer: Arc::new(Middle {
                inner: Arc::new(Leaf),
            }),
        }
    }

    #[test]
    fn missing_member_with_odd_name_is_unknown_attribute() {
        let mut host = Delegator::new(root());
        let err = host
            .set_delegations([("no-such", ["s"])])
            .expect_err("member no-such does not exist");
        assert_eq!(
            err,
            DelegationError::UnknownAttribute {
                member: "no-such".to_string(),
                symbol: "s".to_string(),
            }
        );
        assert!(host.delegations().is_empty());
    }

    #[test]
    fn duplicate_in_batch_wins_over_missing_symbol() {
        let mut host = Delegator::new(root());
        let err = host
            .set_delegations([("outer", ["inner", "inner", "bad name"])])
            .expect_err("inner repeats within the batch");
        assert_eq!(err, DelegationError::DuplicateSymbol("inner".to_string()));
        assert!(host.delegations().is_empty());
    }

    #[test]
    fn accepts_any_name_the_member_resolves() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        host.set_delegations([("inner", ["größe"])])
            .expect("non-ascii symbol resolves on the member");
        assert_eq!(
            host.get("größe").expect("größe resolves").as_value(),
            Some(&Value::Int(3))
        );
    }

    #[test]
    fn with_options_rejects_invalid_options() {
        let zero_depth = RegistryOptions {
            max_resolution_depth: 0,
            ..RegistryOptions::default()
        };
        let err = Delegator::with_options(root(), zero_depth)
            .err()
            .expect("depth 0 must be rejected");
        assert_eq!(err, ConfigError::ResolutionDepthOutOfRange(0));

        let empty_prefix = RegistryOptions {
            private_prefix: String::new(),
            ..RegistryOptions::default()
        };
        let err = Delegator::with_options(root(), empty_prefix)
            .err()
            .expect("empty prefix must be rejected");
        assert_eq!(err, ConfigError::EmptyPrivatePrefix);
    }

    #[test]
    fn rejects_falsy_symbol() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        let err = host
            .set_delegations([("inner", ["empty"])])
            .expect_err("falsy symbol must fail");
        assert_eq!(
            err,
            DelegationError::UnknownAttribute {
                member: "inner".to_string(),
                symbol: "empty".to_string(),
            }
        );
    }

    #[test]
    fn native_attribute_wins_over_delegated_one() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        host.set_delegations([("inner", ["depth"])])
            .expect("shadowed symbol is accepted");

        let native = host.get("depth").expect("native depth");
        assert_eq!(native.as_value(), Some(&Value::Int(0)));
        let delegated = host.resolve("depth").expect("registry depth");
        assert_eq!(delegated.as_value(), Some(&Value::Int(2)));
    }

    #[test]
    fn nested_lookup_stops_at_depth_limit() {
        let options = RegistryOptions {
            max_resolution_depth: 1,
            ..RegistryOptions::default()
        };
        let mut host = Delegator::with_options(root(), options).expect("valid options");
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        host.set_delegations([("inner", ["echo"])])
            .expect("echo should delegate");

        let err = host.get("echo").expect_err("chain deeper than limit");
        assert!(matches!(
            err,
            DelegationError::ResolutionDepthExceeded { limit: 1, .. }
        ));
    }

    #[test]
    fn replace_policy_drops_previous_registrations() {
        let options = RegistryOptions {
            write_policy: WritePolicy::Replace,
            ..RegistryOptions::default()
        };
        let mut host = Delegator::with_options(root(), options).expect("valid options");
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        host.set_delegations([("outer", ["inner"])])
            .expect("replace policy accepts re-registration");
        assert_eq!(host.delegations().len(), 1);
        assert_eq!(host.delegations()["outer"], vec!["inner".to_string()]);
    }

    #[test]
    fn invoke_rejects_non_callable_attribute() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");

        let err = host.invoke("inner", &[]).expect_err("object is not callable");
        assert_eq!(
            err,
            DelegationError::Invoke(InvokeError::NotCallable("inner".to_string()))
        );
        let err = host.invoke("depth", &[]).expect_err("property is not callable");
        assert!(matches!(err, DelegationError::Invoke(_)));
    }

    #[test]
    fn delegator_nests_as_member() {
        let mut inner = Delegator::new(root());
        inner
            .set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");
        inner
            .set_delegations([("inner", ["echo"])])
            .expect("echo should delegate");

        let names: Vec<String> = inner.symbols().into_iter().map(|s| s.name).collect();
        assert!(names.contains(&"echo".to_string()));

        let out = Member::invoke(&inner, "echo", &[Value::from("hi")]).expect("nested call");
        assert_eq!(out, Value::from("hi"));
        let err = Member::invoke(&inner, "missing", &[]).expect_err("missing method");
        assert_eq!(err, InvokeError::UnknownMethod("missing".to_string()));
    }

    #[test]
    fn delegate_methods_skips_already_delegated_names() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");

        let added = host.delegate_methods("inner").expect("methods delegate");
        assert_eq!(added, vec!["echo".to_string()]);
        let added = host.delegate_methods("inner").expect("second pass is a no-op");
        assert!(added.is_empty());

        let err = host
            .delegate_methods("depth")
            .expect_err("property is not a member object");
        assert_eq!(err, DelegationError::UnknownMember("depth".to_string()));
    }

    #[test]
    fn snapshot_serializes_host_id_and_mapping() {
        let mut host = Delegator::new(root());
        host.set_delegations([("outer", ["inner"])])
            .expect("inner should delegate");

        let json = serde_json::to_value(host.snapshot()).expect("serialize snapshot");
        assert_eq!(json["host_id"], host.id().to_string());
        assert_eq!(json["delegations"]["outer"][0], "inner");
    }
}
