//! RADIUS probe exporter
//!
//! Probes a RADIUS authentication server with a signed Access-Request and
//! reports the result as Prometheus gauges.
//!
//! # Example
//!
//! ```no_run
//! use radius_exporter::{probe, Config, ProbeConfig, ProbeMetrics};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_file("config.json")?;
//! let module = config.module("default").ok_or("no default module")?;
//!
//! let outcome = probe(&ProbeConfig::new("192.0.2.10:1812", module)?).await;
//! print!("{}", ProbeMetrics::from_outcome(&outcome).render());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod exchange;
pub mod http;
pub mod metrics;
pub mod probe;
pub mod request;

pub use config::{Config, ConfigError, ConfigFile, Module, ModuleDefaults, ModuleSpec, ProbeConfig};
pub use error::{ProbeError, ProbeResult};
pub use exchange::{resolve_target, Exchange, ExchangeResult, RetryPolicy, DEFAULT_AUTH_PORT};
pub use http::{router, serve, AppState};
pub use metrics::{ProbeMetrics, PrometheusMetrics};
pub use probe::{probe, ProbeOutcome};
pub use request::{build_access_request, RequestBuilder, SignedRequest};
