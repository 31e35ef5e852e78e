//! Probe collector
//!
//! Runs one exchange for a [`ProbeConfig`] and folds whatever happens into a
//! single [`ProbeOutcome`].

use crate::config::ProbeConfig;
use crate::error::{ProbeError, ProbeResult};
use crate::exchange::{resolve_target, Exchange, ExchangeResult};
use crate::request::build_access_request;
use radius_proto::Code;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Result of one probe
#[derive(Debug)]
pub struct ProbeOutcome {
    /// A validated Access-Accept, Access-Reject or Access-Challenge arrived
    pub success: bool,
    pub response_code: Option<Code>,
    /// Wall time of the whole probe, resolution and encoding included
    pub duration: Duration,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    fn succeeded(result: &ExchangeResult, duration: Duration) -> Self {
        ProbeOutcome {
            success: true,
            response_code: Some(result.code),
            duration,
            error: None,
        }
    }

    fn failed(error: ProbeError, duration: Duration) -> Self {
        ProbeOutcome {
            success: false,
            response_code: None,
            duration,
            error: Some(error),
        }
    }

    /// Numeric response code, 0 when none was received
    pub fn response_code_value(&self) -> u8 {
        self.response_code.map(Code::as_u8).unwrap_or(0)
    }
}

/// Probe the configured target once
pub async fn probe(config: &ProbeConfig) -> ProbeOutcome {
    let started = Instant::now();
    let result = exchange(config).await;
    let duration = started.elapsed();

    match result {
        Ok(result) => {
            debug!(
                probe_target = %config.target,
                code = %result.code,
                transmissions = result.transmissions,
                discarded = result.discarded,
                duration_ms = duration.as_millis() as u64,
                "probe succeeded"
            );
            ProbeOutcome::succeeded(&result, duration)
        }
        Err(err) => {
            error!(
                probe_target = %config.target,
                kind = err.kind(),
                error = %err,
                duration_ms = duration.as_millis() as u64,
                "probe failed"
            );
            ProbeOutcome::failed(err, duration)
        }
    }
}

async fn exchange(config: &ProbeConfig) -> ProbeResult<ExchangeResult> {
    let module = &config.module;
    let server = resolve_target(&config.target).await?;
    let request = build_access_request(module)?;

    Exchange::new(
        &request,
        &module.secret,
        server,
        module.policy,
        module.validation_mode,
    )
    .run()
    .await
}
