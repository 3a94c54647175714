//! # ParameterRouter: subscription registry and dispatch engine.
//!
//! The router keeps track of which parameters belong to which subscriptions
//! and fans every provider delivery out to exactly the right consumers.
//!
//! ## Architecture
//! ```text
//!  providers (priority order)           consumers
//!  ┌────────────────┐
//!  │ tm processor   │─┐                ┌──────────────────┐
//!  ├────────────────┤ │  update(batch) │ explicit sub #1  │
//!  │ sys variables  │─┼───────────────►│ explicit sub #2  │
//!  ├────────────────┤ │       │        │ broadcast sub    │
//!  │ algorithm eng. │─┘       │        └──────────────────┘
//!  └────────────────┘         │                ▲
//!                             ▼                │ one callback per cycle
//!                   ┌───────────────────┐      │
//!                   │ partition by      │──────┘
//!                   │ param→sub index   │
//!                   │ + derived pass    │────► ParameterCache (optional)
//!                   └───────────────────┘
//! ```
//!
//! ## Dispatch algorithm (one `update` call)
//! 1. Partition the batch by subscription id through the parameter→subscription
//!    index; one accumulation list per touched subscription.
//! 2. For every derived-value subscription touched so far, invoke its engine
//!    immediately and merge whatever it produces back into the same cycle's
//!    accumulation. One pass only: merged results are never re-fed into a
//!    further derived pass, so second-order derivations resolve next cycle.
//! 3. Append every value (re-tagged per namespace) to each active broadcast
//!    subscription's accumulation.
//! 4. Invoke each consumer whose accumulation is non-empty exactly once.
//!
//! ## Rules
//! - All registry state sits behind one coarse mutex; contention is bounded by
//!   telemetry arrival rate, so fine-grained locking buys nothing here.
//! - Consumer callbacks run synchronously inside the locked region. Calling
//!   back into the router from a callback on the same thread is a contract
//!   violation and panics immediately instead of deadlocking.
//! - Resolution is all-or-nothing: a request with any unresolvable id creates
//!   nothing and activates no provider.
//! - Subscription ids are never reused while the router is alive.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::cache::ParameterCache;
use crate::config::RouterConfig;
use crate::error::RoutingError;
use crate::providers::{ParameterListener, ParameterProvider, ProviderSet, ResolvedItem};
use crate::routing::consumer::{DerivedValueConsumer, IdentifiedValue, ParameterConsumer};
use crate::routing::subscription::{
    Subscription, SubscriptionId, SubscriptionItem, SubscriptionKind,
};
use crate::sync::DispatchGuard;
use crate::values::{Parameter, ParameterId, ParameterValue};

/// One entry of the parameter→subscription index.
///
/// Duplicates are allowed by construction: subscribing the same parameter
/// twice under one subscription yields two entries and two deliveries.
struct IndexEntry {
    sub: SubscriptionId,
    id: ParameterId,
    provider: usize,
}

/// Mutable registry state, guarded by the router's single mutex.
struct RouterInner {
    providers: ProviderSet,
    /// Parameter → subscriptions interested in it (with external ids).
    index: HashMap<Parameter, Vec<IndexEntry>>,
    /// Subscription id → regular consumer callback.
    consumers: HashMap<SubscriptionId, Arc<dyn ParameterConsumer>>,
    /// Subscription id → derived/algorithm engine, invoked within the cycle.
    derived: HashMap<SubscriptionId, Arc<dyn DerivedValueConsumer>>,
    /// Subscription id → bookkeeping record.
    subscriptions: HashMap<SubscriptionId, Subscription>,
    /// Active broadcast subscriptions, in creation order.
    broadcasts: Vec<(SubscriptionId, Option<String>)>,
}

/// Subscription registry and dispatch engine; see the module docs.
pub struct ParameterRouter {
    config: RouterConfig,
    next_id: AtomicU32,
    cache: Option<Arc<ParameterCache>>,
    inner: Mutex<RouterInner>,
}

impl ParameterRouter {
    /// Creates a router without a cache.
    #[must_use]
    pub fn new(config: RouterConfig) -> Arc<Self> {
        Self::build(config, None)
    }

    /// Creates a router that records every delivery into `cache`.
    #[must_use]
    pub fn with_cache(config: RouterConfig, cache: Arc<ParameterCache>) -> Arc<Self> {
        Self::build(config, Some(cache))
    }

    fn build(config: RouterConfig, cache: Option<Arc<ParameterCache>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            next_id: AtomicU32::new(0),
            cache,
            inner: Mutex::new(RouterInner {
                providers: ProviderSet::new(),
                index: HashMap::new(),
                consumers: HashMap::new(),
                derived: HashMap::new(),
                subscriptions: HashMap::new(),
                broadcasts: Vec::new(),
            }),
        })
    }

    /// Registers a provider at the end of the priority chain and installs
    /// this router as its listener.
    ///
    /// Registration order is resolution order: the first provider reporting
    /// `can_provide` owns an identifier.
    pub fn add_provider(self: &Arc<Self>, provider: Arc<dyn ParameterProvider>) {
        provider.set_listener(Arc::clone(self) as Arc<dyn ParameterListener>);
        let _guard = self.enter("ParameterRouter::add_provider");
        self.inner.lock().providers.add(provider);
    }

    /// Activates broadcast providing on every provider.
    ///
    /// Called once after all providers are registered when
    /// [`RouterConfig::cache_all`] is set; a no-op otherwise.
    pub fn start_all(&self) {
        if !self.config.cache_all {
            return;
        }
        let _guard = self.enter("ParameterRouter::start_all");
        let inner = self.inner.lock();
        for provider in inner.providers.iter() {
            provider.start_providing_all();
        }
    }

    /// Resolves an identifier through the provider chain.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] if no provider knows the id.
    pub fn get_parameter(&self, id: &ParameterId) -> Result<Parameter, RoutingError> {
        let _guard = self.enter("ParameterRouter::get_parameter");
        let inner = self.inner.lock();
        Ok(inner.providers.resolve_one(id)?.parameter)
    }

    /// Creates a subscription for `ids`, delivered to `consumer`.
    ///
    /// Atomic: if any id is unresolvable, no subscription is created and no
    /// provider is activated; the error carries the complete unresolved list.
    /// For each newly referenced parameter, `start_providing` is called
    /// exactly once.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] with every offending id.
    pub fn add_request(
        &self,
        ids: &[ParameterId],
        consumer: Arc<dyn ParameterConsumer>,
    ) -> Result<SubscriptionId, RoutingError> {
        let _guard = self.enter("ParameterRouter::add_request");
        let mut inner = self.inner.lock();
        let resolved = inner.providers.resolve(ids)?;
        let sub = self.allocate_id();
        debug!(subscription = %sub, items = ids.len(), "new request");
        let items = self.insert_items(&mut inner, sub, resolved);
        inner.subscriptions.insert(sub, Subscription::explicit(items));
        inner.consumers.insert(sub, consumer);
        Ok(sub)
    }

    /// Creates a derived-value subscription: `consumer` is invoked *during*
    /// the update cycle and its results merge into the same delivery.
    ///
    /// # Errors
    /// [`RoutingError::InvalidIdentification`] with every offending id.
    pub fn add_derived_request(
        &self,
        ids: &[ParameterId],
        consumer: Arc<dyn DerivedValueConsumer>,
    ) -> Result<SubscriptionId, RoutingError> {
        let _guard = self.enter("ParameterRouter::add_derived_request");
        let mut inner = self.inner.lock();
        let resolved = inner.providers.resolve(ids)?;
        let sub = self.allocate_id();
        debug!(subscription = %sub, items = ids.len(), "new derived request");
        let items = self.insert_items(&mut inner, sub, resolved);
        inner.subscriptions.insert(sub, Subscription::explicit(items));
        inner.derived.insert(sub, consumer);
        Ok(sub)
    }

    /// Grows an existing subscription. No dedup is performed: adding an
    /// already subscribed parameter yields duplicate deliveries.
    ///
    /// # Errors
    /// [`RoutingError::InvalidRequestIdentification`] for an unknown or
    /// broadcast subscription (broadcast subscriptions have no item list to
    /// grow); [`RoutingError::InvalidIdentification`] (complete list, no
    /// partial mutation) for unresolvable ids.
    pub fn add_items_to_request(
        &self,
        sub: SubscriptionId,
        ids: &[ParameterId],
    ) -> Result<(), RoutingError> {
        let _guard = self.enter("ParameterRouter::add_items_to_request");
        let mut inner = self.inner.lock();
        Self::require_explicit(&inner, sub)?;
        let resolved = inner.providers.resolve(ids)?;
        debug!(subscription = %sub, items = ids.len(), "adding items to request");
        let items = self.insert_items(&mut inner, sub, resolved);
        if let Some(record) = inner.subscriptions.get_mut(&sub) {
            if let SubscriptionKind::Explicit { items: existing } = &mut record.kind {
                existing.extend(items);
            }
        }
        Ok(())
    }

    /// Shrinks an existing subscription. Ids that do not resolve or are not
    /// part of the subscription are logged and ignored; removal is tolerant
    /// where addition is strict. Removing the last reference to a parameter
    /// triggers `stop_providing`.
    ///
    /// # Errors
    /// [`RoutingError::InvalidRequestIdentification`] for an unknown or
    /// broadcast subscription.
    pub fn remove_items_from_request(
        &self,
        sub: SubscriptionId,
        ids: &[ParameterId],
    ) -> Result<(), RoutingError> {
        let _guard = self.enter("ParameterRouter::remove_items_from_request");
        let mut inner = self.inner.lock();
        Self::require_explicit(&inner, sub)?;
        for id in ids {
            let resolved = match inner.providers.resolve_one(id) {
                Ok(item) => item,
                Err(_) => {
                    warn!(subscription = %sub, id = %id, "removal requested for unresolvable id");
                    continue;
                }
            };
            if !Self::remove_one_item(&mut inner, sub, &resolved.parameter, id, self.config.cache_all)
            {
                warn!(subscription = %sub, id = %id, "removal requested but id not part of subscription");
            }
        }
        Ok(())
    }

    /// Tears down a subscription entirely, returning every external id that
    /// was removed (duplicates included). Providers whose last subscriber
    /// just vanished are released.
    ///
    /// # Errors
    /// [`RoutingError::InvalidRequestIdentification`] for an unknown
    /// subscription.
    pub fn remove_request(&self, sub: SubscriptionId) -> Result<Vec<ParameterId>, RoutingError> {
        let _guard = self.enter("ParameterRouter::remove_request");
        let mut inner = self.inner.lock();
        let record = inner.subscriptions.remove(&sub).ok_or(
            RoutingError::InvalidRequestIdentification {
                subscription_id: sub.value(),
            },
        )?;
        debug!(subscription = %sub, "removing request");
        inner.consumers.remove(&sub);
        inner.derived.remove(&sub);
        match record.kind {
            SubscriptionKind::Explicit { items } => {
                let mut removed = Vec::with_capacity(items.len());
                for item in items {
                    Self::remove_one_item(
                        &mut inner,
                        sub,
                        &item.parameter,
                        &item.id,
                        self.config.cache_all,
                    );
                    removed.push(item.id);
                }
                Ok(removed)
            }
            SubscriptionKind::Broadcast { .. } => {
                inner.broadcasts.retain(|(s, _)| *s != sub);
                Ok(Vec::new())
            }
        }
    }

    /// Creates a broadcast subscription: every value of every delivery is
    /// delivered, tagged with the alias in `namespace` (falling back to the
    /// qualified name). The first broadcast subscription activates
    /// `start_providing_all` on every provider; later ones reuse that
    /// activation.
    pub fn subscribe_all(
        &self,
        namespace: Option<&str>,
        consumer: Arc<dyn ParameterConsumer>,
    ) -> SubscriptionId {
        let _guard = self.enter("ParameterRouter::subscribe_all");
        let mut inner = self.inner.lock();
        let sub = self.allocate_id();
        debug!(subscription = %sub, namespace = ?namespace, "new subscribe-all");
        if inner.broadcasts.is_empty() {
            for provider in inner.providers.iter() {
                provider.start_providing_all();
            }
        }
        let ns = namespace.map(str::to_owned);
        inner.broadcasts.push((sub, ns.clone()));
        inner.subscriptions.insert(sub, Subscription::broadcast(ns));
        inner.consumers.insert(sub, consumer);
        sub
    }

    /// Removes a broadcast subscription. Returns true if it was removed,
    /// false if `sub` is not an active broadcast subscription.
    pub fn unsubscribe_all(&self, sub: SubscriptionId) -> bool {
        let _guard = self.enter("ParameterRouter::unsubscribe_all");
        let mut inner = self.inner.lock();
        let is_broadcast = matches!(
            inner.subscriptions.get(&sub),
            Some(Subscription {
                kind: SubscriptionKind::Broadcast { .. }
            })
        );
        if !is_broadcast {
            return false;
        }
        inner.subscriptions.remove(&sub);
        inner.consumers.remove(&sub);
        inner.broadcasts.retain(|(s, _)| *s != sub);
        true
    }

    /// Accepts one delivery and dispatches it; see the module docs for the
    /// algorithm. Runs synchronously on the calling (provider) thread.
    ///
    /// # Panics
    /// Panics on reentrant dispatch: a consumer calling back into the router
    /// from within its callback violates the locking contract.
    pub fn update(&self, batch: Vec<ParameterValue>) {
        let _guard = self.enter("ParameterRouter::update");
        let inner = self.inner.lock();
        trace!(values = batch.len(), "routing delivery");

        let mut delivery: HashMap<SubscriptionId, Vec<IdentifiedValue>> = HashMap::new();
        self.accumulate(&inner, &mut delivery, &batch);

        // Derived pass: each engine is consulted at most once per cycle, in
        // subscription order. Its output merges into the accumulation (and
        // into broadcast lists) but never triggers another derived pass.
        let mut derived_subs: Vec<SubscriptionId> = inner.derived.keys().copied().collect();
        derived_subs.sort_unstable();
        for sub in derived_subs {
            let Some(items) = delivery.get(&sub).cloned() else {
                continue;
            };
            let engine = &inner.derived[&sub];
            match engine.update_derived(sub, &items) {
                Ok(values) if !values.is_empty() => {
                    self.accumulate(&inner, &mut delivery, &values);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(subscription = %sub, error = %e, "derived value recomputation failed");
                }
            }
        }

        // Final delivery: one callback per touched subscription, derived
        // engines excluded (they already ran).
        let mut subs: Vec<SubscriptionId> = delivery.keys().copied().collect();
        subs.sort_unstable();
        for sub in subs {
            if inner.derived.contains_key(&sub) {
                continue;
            }
            let items = &delivery[&sub];
            if items.is_empty() {
                continue;
            }
            match inner.consumers.get(&sub) {
                Some(consumer) => consumer.update_items(sub, items),
                None => {
                    warn!(subscription = %sub, "delivery for subscription without a consumer");
                }
            }
        }
    }

    /// Partitions `values` into per-subscription accumulation lists, appends
    /// them to every broadcast subscription, and records them in the cache.
    fn accumulate(
        &self,
        inner: &RouterInner,
        delivery: &mut HashMap<SubscriptionId, Vec<IdentifiedValue>>,
        values: &[ParameterValue],
    ) {
        if values.is_empty() {
            return;
        }
        for pv in values {
            let Some(entries) = inner.index.get(&pv.parameter) else {
                continue;
            };
            for entry in entries {
                delivery.entry(entry.sub).or_default().push(IdentifiedValue {
                    id: entry.id.clone(),
                    value: pv.clone(),
                });
            }
        }
        for (sub, namespace) in &inner.broadcasts {
            let list = delivery.entry(*sub).or_default();
            for pv in values {
                let id = match namespace {
                    Some(ns) => ParameterId::new(ns.clone(), pv.parameter.alias_or_name(ns)),
                    None => ParameterId::qualified(pv.parameter.qualified_name()),
                };
                list.push(IdentifiedValue {
                    id,
                    value: pv.clone(),
                });
            }
        }
        if let Some(cache) = &self.cache {
            cache.update(values);
        }
    }

    /// Inserts resolved items into the index, activating providers for
    /// parameters gaining their first reference.
    fn insert_items(
        &self,
        inner: &mut RouterInner,
        sub: SubscriptionId,
        resolved: Vec<ResolvedItem>,
    ) -> Vec<SubscriptionItem> {
        let mut items = Vec::with_capacity(resolved.len());
        for r in resolved {
            trace!(subscription = %sub, parameter = %r.parameter, provider = r.provider, "adding item");
            let entries = inner.index.entry(r.parameter.clone()).or_default();
            if entries.is_empty() && !self.config.cache_all {
                inner.providers.get(r.provider).start_providing(&r.parameter);
            }
            entries.push(IndexEntry {
                sub,
                id: r.id.clone(),
                provider: r.provider,
            });
            items.push(SubscriptionItem {
                id: r.id,
                parameter: r.parameter,
            });
        }
        items
    }

    /// Removes one index entry matching `(sub, id)` under `parameter`.
    /// Releases the provider when the last reference disappears. Returns
    /// false if no matching entry existed.
    fn remove_one_item(
        inner: &mut RouterInner,
        sub: SubscriptionId,
        parameter: &Parameter,
        id: &ParameterId,
        cache_all: bool,
    ) -> bool {
        let Some(entries) = inner.index.get_mut(parameter) else {
            return false;
        };
        let Some(pos) = entries.iter().position(|e| e.sub == sub && e.id == *id) else {
            return false;
        };
        let entry = entries.remove(pos);
        if entries.is_empty() {
            inner.index.remove(parameter);
            if !cache_all {
                inner.providers.get(entry.provider).stop_providing(parameter);
            }
        }
        // Keep the subscription record in sync when it still exists (it is
        // already gone when called from remove_request).
        if let Some(record) = inner.subscriptions.get_mut(&sub) {
            if let SubscriptionKind::Explicit { items } = &mut record.kind {
                if let Some(pos) = items
                    .iter()
                    .position(|i| i.parameter == *parameter && i.id == *id)
                {
                    items.remove(pos);
                }
            }
        }
        true
    }

    /// Checks that `sub` names an existing explicit subscription. Item
    /// mutation on broadcast subscriptions is rejected: they carry no item
    /// list, and index entries added under one would orphan at teardown.
    fn require_explicit(inner: &RouterInner, sub: SubscriptionId) -> Result<(), RoutingError> {
        match inner.subscriptions.get(&sub) {
            Some(Subscription {
                kind: SubscriptionKind::Explicit { .. },
            }) => Ok(()),
            _ => Err(RoutingError::InvalidRequestIdentification {
                subscription_id: sub.value(),
            }),
        }
    }

    fn allocate_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn enter(&self, what: &'static str) -> DispatchGuard {
        DispatchGuard::enter(self as *const Self as *const (), what)
    }
}

impl ParameterListener for ParameterRouter {
    fn update(&self, batch: Vec<ParameterValue>) {
        ParameterRouter::update(self, batch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::sync::Mutex as StdMutex;

    use crate::values::Value;

    /// Provider backed by a fixed parameter table, counting activations.
    struct MockProvider {
        table: HashMap<String, Parameter>,
        started: StdMutex<HashMap<String, usize>>,
        stopped: StdMutex<HashMap<String, usize>>,
        providing_all: AtomicBool,
        listener: StdMutex<Option<Arc<dyn ParameterListener>>>,
    }

    impl MockProvider {
        fn new(names: &[&str]) -> Arc<Self> {
            let table = names
                .iter()
                .map(|n| ((*n).to_string(), Parameter::new(*n)))
                .collect();
            Arc::new(Self {
                table,
                started: StdMutex::new(HashMap::new()),
                stopped: StdMutex::new(HashMap::new()),
                providing_all: AtomicBool::new(false),
                listener: StdMutex::new(None),
            })
        }

        fn parameter(&self, name: &str) -> Parameter {
            self.table[name].clone()
        }

        fn started_count(&self, name: &str) -> usize {
            *self.started.lock().unwrap().get(name).unwrap_or(&0)
        }

        fn stopped_count(&self, name: &str) -> usize {
            *self.stopped.lock().unwrap().get(name).unwrap_or(&0)
        }

        fn push(&self, batch: Vec<ParameterValue>) {
            let listener = self.listener.lock().unwrap().clone().unwrap();
            listener.update(batch);
        }
    }

    impl ParameterProvider for MockProvider {
        fn can_provide(&self, id: &ParameterId) -> bool {
            self.table.contains_key(&id.name)
        }

        fn get_parameter(&self, id: &ParameterId) -> Result<Parameter, RoutingError> {
            self.table
                .get(&id.name)
                .cloned()
                .ok_or_else(|| RoutingError::InvalidIdentification {
                    ids: vec![id.clone()],
                })
        }

        fn start_providing(&self, parameter: &Parameter) {
            *self
                .started
                .lock()
                .unwrap()
                .entry(parameter.qualified_name().to_string())
                .or_insert(0) += 1;
        }

        fn stop_providing(&self, parameter: &Parameter) {
            *self
                .stopped
                .lock()
                .unwrap()
                .entry(parameter.qualified_name().to_string())
                .or_insert(0) += 1;
        }

        fn start_providing_all(&self) {
            self.providing_all.store(true, Ordering::SeqCst);
        }

        fn set_listener(&self, listener: Arc<dyn ParameterListener>) {
            *self.listener.lock().unwrap() = Some(listener);
        }
    }

    /// Consumer recording every callback it receives.
    #[derive(Default)]
    struct Recorder {
        calls: StdMutex<Vec<(SubscriptionId, Vec<IdentifiedValue>)>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn calls(&self) -> Vec<(SubscriptionId, Vec<IdentifiedValue>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ParameterConsumer for Recorder {
        fn update_items(&self, subscription: SubscriptionId, items: &[IdentifiedValue]) {
            self.calls
                .lock()
                .unwrap()
                .push((subscription, items.to_vec()));
        }
    }

    fn pv(parameter: &Parameter, v: i64) -> ParameterValue {
        ParameterValue::new(parameter.clone())
            .with_eng_value(Value::Sint64(v))
            .with_generation_time(v)
    }

    fn qid(name: &str) -> ParameterId {
        ParameterId::qualified(name)
    }

    fn setup(names: &[&str]) -> (Arc<ParameterRouter>, Arc<MockProvider>) {
        let router = ParameterRouter::new(RouterConfig::default());
        let provider = MockProvider::new(names);
        router.add_provider(provider.clone() as Arc<dyn ParameterProvider>);
        (router, provider)
    }

    #[test]
    fn test_add_request_with_invalid_id_is_atomic() {
        // All-or-nothing: no subscription, no start_providing for any id.
        let (router, provider) = setup(&["/SAT1/A", "/SAT1/B"]);
        let consumer = Recorder::new();
        let err = router
            .add_request(
                &[qid("/SAT1/A"), qid("/SAT1/Bogus"), qid("/SAT1/B")],
                consumer.clone(),
            )
            .unwrap_err();
        assert_eq!(err.invalid_ids().map(<[_]>::len), Some(1));
        assert_eq!(provider.started_count("/SAT1/A"), 0);
        assert_eq!(provider.started_count("/SAT1/B"), 0);

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
        assert!(consumer.calls().is_empty());
    }

    #[test]
    fn test_single_callback_per_cycle_with_all_matches() {
        // One callback per update, all matching values merged.
        let (router, provider) = setup(&["/SAT1/A", "/SAT1/B", "/SAT1/C"]);
        let consumer = Recorder::new();
        let sub = router
            .add_request(&[qid("/SAT1/A"), qid("/SAT1/B")], consumer.clone())
            .unwrap();

        let a = provider.parameter("/SAT1/A");
        let b = provider.parameter("/SAT1/B");
        let c = provider.parameter("/SAT1/C");
        provider.push(vec![pv(&a, 1), pv(&c, 2), pv(&b, 3), pv(&a, 4)]);

        let calls = consumer.calls();
        assert_eq!(calls.len(), 1);
        let (got_sub, items) = &calls[0];
        assert_eq!(*got_sub, sub);
        // Arrival order within the batch is preserved; C is not subscribed.
        let tags: Vec<&str> = items.iter().map(|i| i.id.name.as_str()).collect();
        assert_eq!(tags, ["/SAT1/A", "/SAT1/B", "/SAT1/A"]);
    }

    #[test]
    fn test_duplicate_items_are_delivered_twice() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let consumer = Recorder::new();
        let sub = router.add_request(&[qid("/SAT1/A")], consumer.clone()).unwrap();
        router
            .add_items_to_request(sub, &[qid("/SAT1/A")])
            .unwrap();
        // Still one provider activation for the parameter.
        assert_eq!(provider.started_count("/SAT1/A"), 1);

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
        let calls = consumer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.len(), 2);
    }

    #[test]
    fn test_remove_request_releases_provider_and_stops_delivery() {
        // stop_providing exactly once, no callback afterwards.
        let (router, provider) = setup(&["/SAT1/A", "/SAT1/B"]);
        let consumer = Recorder::new();
        let sub = router
            .add_request(&[qid("/SAT1/A"), qid("/SAT1/B")], consumer.clone())
            .unwrap();

        let removed = router.remove_request(sub).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(provider.stopped_count("/SAT1/A"), 1);
        assert_eq!(provider.stopped_count("/SAT1/B"), 1);

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
        assert!(consumer.calls().is_empty());
    }

    #[test]
    fn test_provider_released_only_after_last_subscriber() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let c1 = Recorder::new();
        let c2 = Recorder::new();
        let s1 = router.add_request(&[qid("/SAT1/A")], c1).unwrap();
        let s2 = router.add_request(&[qid("/SAT1/A")], c2).unwrap();
        assert_eq!(provider.started_count("/SAT1/A"), 1);

        router.remove_request(s1).unwrap();
        assert_eq!(provider.stopped_count("/SAT1/A"), 0);
        router.remove_request(s2).unwrap();
        assert_eq!(provider.stopped_count("/SAT1/A"), 1);
    }

    #[test]
    fn test_restart_after_full_release_activates_again() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let sub = router.add_request(&[qid("/SAT1/A")], Recorder::new()).unwrap();
        router.remove_request(sub).unwrap();
        router.add_request(&[qid("/SAT1/A")], Recorder::new()).unwrap();
        assert_eq!(provider.started_count("/SAT1/A"), 2);
        assert_eq!(provider.stopped_count("/SAT1/A"), 1);
    }

    #[test]
    fn test_remove_items_tolerates_unknown_and_unsubscribed_ids() {
        let (router, provider) = setup(&["/SAT1/A", "/SAT1/B"]);
        let consumer = Recorder::new();
        let sub = router.add_request(&[qid("/SAT1/A")], consumer.clone()).unwrap();

        // Unresolvable and not-subscribed ids are ignored; the valid one is removed.
        router
            .remove_items_from_request(sub, &[qid("/SAT1/Bogus"), qid("/SAT1/B"), qid("/SAT1/A")])
            .unwrap();
        assert_eq!(provider.stopped_count("/SAT1/A"), 1);

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
        assert!(consumer.calls().is_empty());
    }

    #[test]
    fn test_unknown_subscription_is_a_protocol_error() {
        let (router, _provider) = setup(&["/SAT1/A"]);
        let bogus = SubscriptionId(999);
        let err = router.add_items_to_request(bogus, &[qid("/SAT1/A")]).unwrap_err();
        assert_eq!(err.as_label(), "invalid_request_identification");
        let err = router.remove_request(bogus).unwrap_err();
        assert_eq!(err.as_label(), "invalid_request_identification");
    }

    #[test]
    fn test_subscription_ids_are_monotonic() {
        let (router, _provider) = setup(&["/SAT1/A"]);
        let s1 = router.add_request(&[qid("/SAT1/A")], Recorder::new()).unwrap();
        router.remove_request(s1).unwrap();
        let s2 = router.add_request(&[qid("/SAT1/A")], Recorder::new()).unwrap();
        assert!(s2 > s1, "ids are never reused");
    }

    #[test]
    fn test_subscribe_all_tags_with_alias_and_falls_back() {
        let router = ParameterRouter::new(RouterConfig::default());
        let aliased = Parameter::new("/SAT1/A").with_alias("OPS", "ALPHA");
        let plain = Parameter::new("/SAT1/B");
        let provider = MockProvider::new(&[]);
        // Hand-build a provider table with the aliased definitions.
        let provider = Arc::new(MockProvider {
            table: [
                ("/SAT1/A".to_string(), aliased.clone()),
                ("/SAT1/B".to_string(), plain.clone()),
            ]
            .into_iter()
            .collect(),
            started: StdMutex::new(HashMap::new()),
            stopped: StdMutex::new(HashMap::new()),
            providing_all: AtomicBool::new(false),
            listener: StdMutex::new(provider.listener.lock().unwrap().clone()),
        });
        router.add_provider(provider.clone() as Arc<dyn ParameterProvider>);

        let consumer = Recorder::new();
        let sub = router.subscribe_all(Some("OPS"), consumer.clone());
        assert!(provider.providing_all.load(Ordering::SeqCst));

        provider.push(vec![pv(&aliased, 1), pv(&plain, 2)]);
        let calls = consumer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, sub);
        let ids: Vec<String> = calls[0].1.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(ids, ["OPS/ALPHA", "OPS//SAT1/B"]);

        assert!(router.unsubscribe_all(sub));
        assert!(!router.unsubscribe_all(sub));
        provider.push(vec![pv(&plain, 3)]);
        assert_eq!(consumer.calls().len(), 1);
    }

    #[test]
    fn test_broadcast_subscriptions_reject_item_mutation() {
        // Index entries added under a broadcast subscription would never be
        // torn down with it, leaking the provider activation.
        let (router, provider) = setup(&["/SAT1/A"]);
        let sub = router.subscribe_all(None, Recorder::new());

        let err = router.add_items_to_request(sub, &[qid("/SAT1/A")]).unwrap_err();
        assert_eq!(err.as_label(), "invalid_request_identification");
        let err = router
            .remove_items_from_request(sub, &[qid("/SAT1/A")])
            .unwrap_err();
        assert_eq!(err.as_label(), "invalid_request_identification");
        assert_eq!(provider.started_count("/SAT1/A"), 0);

        router.remove_request(sub).unwrap();
        assert_eq!(provider.stopped_count("/SAT1/A"), 0);
    }

    #[test]
    fn test_subscribe_all_without_namespace_uses_qualified_names() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let consumer = Recorder::new();
        router.subscribe_all(None, consumer.clone());
        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
        assert_eq!(consumer.calls()[0].1[0].id, qid("/SAT1/A"));
    }

    /// Derived engine producing one output value per matched input.
    struct DoublingEngine {
        output: Parameter,
        calls: AtomicUsize,
        fail: bool,
    }

    impl DerivedValueConsumer for DoublingEngine {
        fn update_derived(
            &self,
            _subscription: SubscriptionId,
            items: &[IdentifiedValue],
        ) -> Result<Vec<ParameterValue>, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("engine exploded".to_string());
            }
            Ok(items
                .iter()
                .map(|i| {
                    let v = match i.value.eng_value {
                        Some(Value::Sint64(v)) => v * 2,
                        _ => 0,
                    };
                    pv(&self.output, v)
                })
                .collect())
        }
    }

    #[test]
    fn test_derived_values_merge_into_same_cycle() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let derived_param = Parameter::new("/SAT1/Derived");

        let engine = Arc::new(DoublingEngine {
            output: derived_param.clone(),
            calls: AtomicUsize::new(0),
            fail: false,
        });
        router.add_derived_request(&[qid("/SAT1/A")], engine.clone()).unwrap();

        // Subscribe a plain consumer to the derived output via a provider that
        // knows it (second in the chain).
        let derived_provider = Arc::new(MockProvider {
            table: [("/SAT1/Derived".to_string(), derived_param.clone())]
                .into_iter()
                .collect(),
            started: StdMutex::new(HashMap::new()),
            stopped: StdMutex::new(HashMap::new()),
            providing_all: AtomicBool::new(false),
            listener: StdMutex::new(None),
        });
        router.add_provider(derived_provider as Arc<dyn ParameterProvider>);

        let consumer = Recorder::new();
        router
            .add_request(&[qid("/SAT1/A"), qid("/SAT1/Derived")], consumer.clone())
            .unwrap();

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 21)]);

        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        let calls = consumer.calls();
        assert_eq!(calls.len(), 1, "input and derived output arrive in one callback");
        let tags: Vec<&str> = calls[0].1.iter().map(|i| i.id.name.as_str()).collect();
        assert_eq!(tags, ["/SAT1/A", "/SAT1/Derived"]);
        assert_eq!(calls[0].1[1].value.eng_value, Some(Value::Sint64(42)));
    }

    #[test]
    fn test_failing_derived_engine_does_not_block_delivery() {
        let (router, provider) = setup(&["/SAT1/A"]);
        let engine = Arc::new(DoublingEngine {
            output: Parameter::new("/SAT1/Derived"),
            calls: AtomicUsize::new(0),
            fail: true,
        });
        router.add_derived_request(&[qid("/SAT1/A")], engine.clone()).unwrap();

        let consumer = Recorder::new();
        router.add_request(&[qid("/SAT1/A")], consumer.clone()).unwrap();

        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 5)]);
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
        let calls = consumer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.len(), 1);
    }

    #[test]
    fn test_cache_all_suppresses_per_parameter_activation() {
        let router = ParameterRouter::new(RouterConfig { cache_all: true });
        let provider = MockProvider::new(&["/SAT1/A"]);
        router.add_provider(provider.clone() as Arc<dyn ParameterProvider>);
        router.start_all();
        assert!(provider.providing_all.load(Ordering::SeqCst));

        let sub = router.add_request(&[qid("/SAT1/A")], Recorder::new()).unwrap();
        assert_eq!(provider.started_count("/SAT1/A"), 0);
        router.remove_request(sub).unwrap();
        assert_eq!(provider.stopped_count("/SAT1/A"), 0);
    }

    #[test]
    #[should_panic(expected = "reentrant call into ParameterRouter")]
    fn test_reentrant_dispatch_fails_fast() {
        struct Reenter {
            router: StdMutex<Option<Arc<ParameterRouter>>>,
        }
        impl ParameterConsumer for Reenter {
            fn update_items(&self, _sub: SubscriptionId, items: &[IdentifiedValue]) {
                let router = self.router.lock().unwrap().clone().unwrap();
                router.update(vec![items[0].value.clone()]);
            }
        }

        let (router, provider) = setup(&["/SAT1/A"]);
        let consumer = Arc::new(Reenter {
            router: StdMutex::new(Some(router.clone())),
        });
        router.add_request(&[qid("/SAT1/A")], consumer).unwrap();
        provider.push(vec![pv(&provider.parameter("/SAT1/A"), 1)]);
    }
}
