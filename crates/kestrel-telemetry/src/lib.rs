//! Kestrel Telemetry
//!
//! A store middleware that watches browser actions and derives:
//! - redirect chains between committed navigations, reported for search ad
//!   click attribution
//! - page-load, download and open-tab events
//! - engine session kill counters and ages
//!
//! Nothing in here fails the dispatch. Lookup misses and sink errors are
//! logged and dropped.

mod ads;
mod clock;
mod error;
mod event;
mod middleware;
mod redirect;
mod registry;
mod settings;

pub use ads::{AdsTelemetry, SearchAdsTelemetry, SearchProvider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{AttributionError, TelemetryError};
pub use event::{EngineMetrics, Event, MetricController, TabKillLabel};
pub use middleware::TelemetryMiddleware;
pub use redirect::{RedirectChain, RedirectChainTracker};
pub use registry::{MetricsRegistry, MetricsSnapshot, TimingDistribution};
pub use settings::Settings;

pub type Result<T> = std::result::Result<T, TelemetryError>;
