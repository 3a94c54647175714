//! # paramflow
//!
//! **Paramflow** is a telemetry parameter subscription-routing library.
//!
//! It provides the primitives a mission-control processor is built from:
//! providers push batches of parameter values, consumers subscribe to the
//! parameters they care about, and the router fans every delivery out with
//! exactly one callback per interested consumer. A delivery-grouped cache and
//! a per-parameter alarm state machine complete the chain.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐
//!  │ packet        │  │ system-var    │  │ algorithm     │   ParameterProvider
//!  │ processor     │  │ provider      │  │ engine        │   (capability side)
//!  └──────┬────────┘  └──────┬────────┘  └──────┬────────┘
//!         │ update(batch)    │                  │            ParameterListener
//!         ▼                  ▼                  ▼            (data side)
//! ┌────────────────────────────────────────────────────────────┐
//! │  ParameterRouter                                           │
//! │  - ProviderSet (first-capable-wins resolution)             │
//! │  - subscription index: Parameter ─► interested consumers   │
//! │  - derived-value pass (engines consulted once per cycle)   │
//! │  - broadcast subscriptions (subscribe_all, per namespace)  │
//! └──────┬──────────────────────┬─────────────────────┬───────┘
//!        │ update_items()       │ update_items()      │ update()
//!        ▼                      ▼                     ▼
//! ┌──────────────┐      ┌──────────────┐      ┌────────────────┐
//! │ consumer #1  │      │ consumer #2  │      │ ParameterCache │
//! │ (display)    │      │ (archive)    │      │ (per delivery) │
//! └──────────────┘      └──────────────┘      └────────────────┘
//!
//!  after limit checking, per sample:
//! ┌────────────────────────────────────────────────────────────┐
//! │  AlarmServer ── hysteresis / latching / severity tracking  │
//! └──────┬─────────────────────────────────────────────────────┘
//!        │ on_alarm(kind, alarm)
//!        ▼
//!   AlarmListener (storage, notifications, AlarmLogWriter)
//! ```
//!
//! ### Delivery cycle
//! ```text
//! provider ──► ParameterRouter::update(batch)
//!
//! cycle {
//!   ├─► partition the batch by subscription (index + broadcasts)
//!   ├─► derived pass: feed each derived-value engine its slice, once;
//!   │     merge the produced values into the same cycle (one level only)
//!   ├─► feed the cache (one shared entry for the whole delivery)
//!   └─► deliver: one update_items() per subscription, ascending id,
//!         empty lists skipped
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                                |
//! |-------------------|-------------------------------------------------------------------|---------------------------------------------------|
//! | **Routing**       | Subscriptions in, one callback per consumer per delivery out.     | [`ParameterRouter`], [`SubscriptionId`]           |
//! | **Providers**     | Capability protocol for parameter sources.                        | [`ParameterProvider`], [`ParameterListener`]      |
//! | **Consumers**     | Callback seams for plain and derived-value subscribers.           | [`ParameterConsumer`], [`DerivedValueConsumer`]   |
//! | **Caching**       | Last-delivery cache with delivery-grouped retrieval.              | [`ParameterCache`]                                |
//! | **Alarms**        | Per-parameter state machine with hysteresis and latching.         | [`AlarmServer`], [`AlarmListener`]                |
//! | **Values**        | Parameter handles, samples and monitoring classification.         | [`Parameter`], [`ParameterValue`], [`MonitoringResult`] |
//! | **Errors**        | Typed errors for identification failures.                         | [`RoutingError`]                                  |
//! | **Configuration** | Centralize router settings.                                       | [`RouterConfig`]                                  |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`AlarmLogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use paramflow::{
//!     IdentifiedValue, Parameter, ParameterConsumer, ParameterId, ParameterListener,
//!     ParameterProvider, ParameterRouter, ParameterValue, RouterConfig, RoutingError,
//!     SubscriptionId, Value,
//! };
//!
//! /// A provider over a fixed parameter set that pushes on demand.
//! struct StaticProvider {
//!     parameters: Vec<Parameter>,
//!     listener: Mutex<Option<Arc<dyn ParameterListener>>>,
//! }
//!
//! impl ParameterProvider for StaticProvider {
//!     fn can_provide(&self, id: &ParameterId) -> bool {
//!         self.parameters.iter().any(|p| p.matches(id))
//!     }
//!     fn get_parameter(&self, id: &ParameterId) -> Result<Parameter, RoutingError> {
//!         self.parameters
//!             .iter()
//!             .find(|p| p.matches(id))
//!             .cloned()
//!             .ok_or_else(|| RoutingError::InvalidIdentification { ids: vec![id.clone()] })
//!     }
//!     fn start_providing(&self, _parameter: &Parameter) {}
//!     fn stop_providing(&self, _parameter: &Parameter) {}
//!     fn start_providing_all(&self) {}
//!     fn set_listener(&self, listener: Arc<dyn ParameterListener>) {
//!         *self.listener.lock().unwrap() = Some(listener);
//!     }
//! }
//!
//! struct Printer;
//!
//! impl ParameterConsumer for Printer {
//!     fn update_items(&self, sub: SubscriptionId, items: &[IdentifiedValue]) {
//!         for item in items {
//!             println!("[{sub}] {} = {:?}", item.id, item.value.effective_value());
//!         }
//!     }
//! }
//!
//! fn main() -> Result<(), RoutingError> {
//!     let volt = Parameter::new("/SAT1/POWER/BusVoltage");
//!     let provider = Arc::new(StaticProvider {
//!         parameters: vec![volt.clone()],
//!         listener: Mutex::new(None),
//!     });
//!
//!     let router = ParameterRouter::new(RouterConfig::default());
//!     router.add_provider(provider.clone());
//!
//!     // Subscribe, then let the provider push one delivery through.
//!     let id = ParameterId::qualified("/SAT1/POWER/BusVoltage");
//!     router.add_request(&[id], Arc::new(Printer))?;
//!
//!     let listener = provider.listener.lock().unwrap().clone().unwrap();
//!     listener.update(vec![
//!         ParameterValue::new(volt).with_eng_value(Value::Double(28.4)),
//!     ]);
//!     Ok(())
//! }
//! ```
mod alarms;
mod cache;
mod config;
mod error;
mod providers;
mod routing;
mod sync;
mod values;

// ---- Public re-exports ----

pub use alarms::{ActiveAlarm, AlarmEventKind, AlarmListener, AlarmServer};
pub use cache::ParameterCache;
pub use config::RouterConfig;
pub use error::RoutingError;
pub use providers::{ParameterListener, ParameterProvider};
pub use routing::{
    DerivedValueConsumer, IdentifiedValue, ParameterConsumer, ParameterRouter, SubscriptionId,
};
pub use values::{
    AcquisitionStatus, FloatRange, MonitoringResult, Parameter, ParameterId, ParameterValue, Value,
};

// Optional: expose a simple built-in alarm logger (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use alarms::AlarmLogWriter;
