//! One request/response exchange with a RADIUS server
//!
//! The exchange owns a connected UDP socket for its whole lifetime and walks
//! a small state machine:
//!
//! ```text
//! Sending -> AwaitingResponse -> Validating -> Done
//!               |    ^               |
//!               |    +---------------+  invalid datagram (counted)
//!               v
//!            TimedOut -> Sending         retries left
//!                     -> Exhausted       otherwise
//! ```
//!
//! Retransmissions reuse the signed request bytes unchanged. Invalid
//! datagrams never consume a retry and never extend the attempt deadline.
//! All attempts share one overall deadline.
//!
//! Dropping the future returned by [`Exchange::run`] cancels the pending
//! receive and closes the socket.

use crate::error::{ProbeError, ProbeResult};
use crate::request::SignedRequest;
use radius_proto::{validate_response, Code, Packet, ValidationMode};
use std::io::ErrorKind;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

/// Standard RADIUS authentication port
pub const DEFAULT_AUTH_PORT: u16 = 1812;

/// Retransmission and tolerance settings for one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Deadline for the whole exchange, all retries included
    pub timeout: Duration,
    /// Retransmissions after the first send
    pub retries: u32,
    /// How long to wait for a reply to each transmission
    pub attempt_timeout: Duration,
    /// Invalid datagrams tolerated; one more fails the exchange
    pub max_packet_errors: u32,
}

impl RetryPolicy {
    /// Split `timeout` evenly across the first send and every retry
    pub fn new(timeout: Duration, retries: u32, max_packet_errors: u32) -> Self {
        RetryPolicy {
            timeout,
            retries,
            attempt_timeout: timeout / retries.saturating_add(1),
            max_packet_errors,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Total transmissions allowed, first send included
    pub fn transmissions(&self) -> u32 {
        self.retries.saturating_add(1)
    }
}

/// Non-terminal states of the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeState {
    Sending,
    AwaitingResponse,
    /// A datagram of this many bytes is in the receive buffer
    Validating(usize),
    TimedOut,
}

/// A validated response
#[derive(Debug, Clone)]
pub struct ExchangeResult {
    pub code: Code,
    /// Time from the first transmission to the accepted response
    pub latency: Duration,
    /// Transmissions made, first send included
    pub transmissions: u32,
    /// Datagrams received and discarded as invalid
    pub discarded: u32,
    pub response: Packet,
}

/// A single Access-Request exchange
pub struct Exchange<'a> {
    request: &'a SignedRequest,
    secret: &'a [u8],
    server: SocketAddr,
    policy: RetryPolicy,
    mode: ValidationMode,
}

impl<'a> Exchange<'a> {
    pub fn new(
        request: &'a SignedRequest,
        secret: &'a [u8],
        server: SocketAddr,
        policy: RetryPolicy,
        mode: ValidationMode,
    ) -> Self {
        Exchange {
            request,
            secret,
            server,
            policy,
            mode,
        }
    }

    /// Run the exchange to completion
    pub async fn run(&self) -> ProbeResult<ExchangeResult> {
        let socket = bind_for(self.server).await?;
        socket.connect(self.server).await?;

        let started = Instant::now();
        let overall_deadline = started.checked_add(self.policy.timeout).ok_or_else(|| {
            ProbeError::Configuration(format!("Timeout {:?} is out of range", self.policy.timeout))
        })?;
        let mut attempt_deadline = overall_deadline;
        let mut transmissions = 0u32;
        let mut discarded = 0u32;
        // One spare byte so an oversized datagram is seen as oversized
        let mut buf = vec![0u8; Packet::MAX_PACKET_SIZE + 1];
        let mut state = ExchangeState::Sending;

        loop {
            trace!(server = %self.server, state = ?state, "exchange state");
            state = match state {
                ExchangeState::Sending => {
                    match socket.send(&self.request.bytes).await {
                        Ok(_) => {}
                        // ICMP unreachable from an earlier send; the datagram is treated as lost
                        Err(e) if e.kind() == ErrorKind::ConnectionRefused => {
                            debug!(server = %self.server, "send reported connection refused");
                        }
                        Err(e) => return Err(ProbeError::Transport(e)),
                    }
                    transmissions += 1;
                    attempt_deadline = Instant::now()
                        .checked_add(self.policy.attempt_timeout)
                        .map_or(overall_deadline, |deadline| deadline.min(overall_deadline));
                    debug!(
                        server = %self.server,
                        identifier = self.request.packet.identifier,
                        attempt = transmissions,
                        bytes = self.request.bytes.len(),
                        "Access-Request sent"
                    );
                    ExchangeState::AwaitingResponse
                }

                ExchangeState::AwaitingResponse => {
                    match timeout_at(attempt_deadline, socket.recv(&mut buf)).await {
                        Err(_) => ExchangeState::TimedOut,
                        Ok(Ok(len)) => ExchangeState::Validating(len),
                        Ok(Err(e)) if e.kind() == ErrorKind::ConnectionRefused => {
                            debug!(server = %self.server, "port unreachable, waiting out the attempt");
                            ExchangeState::AwaitingResponse
                        }
                        Ok(Err(e)) => return Err(ProbeError::Transport(e)),
                    }
                }

                ExchangeState::Validating(len) => {
                    match validate_response(&buf[..len], &self.request.packet, self.secret, self.mode)
                    {
                        Ok(response) => {
                            let latency = started.elapsed();
                            debug!(
                                server = %self.server,
                                code = %response.code,
                                latency_ms = latency.as_millis() as u64,
                                transmissions,
                                discarded,
                                "response accepted"
                            );
                            return Ok(ExchangeResult {
                                code: response.code,
                                latency,
                                transmissions,
                                discarded,
                                response,
                            });
                        }
                        Err(err) => {
                            discarded += 1;
                            warn!(
                                server = %self.server,
                                error = %err,
                                discarded,
                                tolerance = self.policy.max_packet_errors,
                                "discarding invalid response"
                            );
                            if discarded > self.policy.max_packet_errors {
                                return Err(ProbeError::TooManyMalformedResponses {
                                    count: discarded,
                                    last: err,
                                });
                            }
                            ExchangeState::AwaitingResponse
                        }
                    }
                }

                ExchangeState::TimedOut => {
                    let retries_left = transmissions < self.policy.transmissions();
                    if retries_left && Instant::now() < overall_deadline {
                        debug!(
                            server = %self.server,
                            attempt = transmissions,
                            "no response, retransmitting"
                        );
                        ExchangeState::Sending
                    } else {
                        return Err(ProbeError::Timeout {
                            attempts: transmissions,
                        });
                    }
                }
            };
        }
    }
}

async fn bind_for(server: SocketAddr) -> ProbeResult<UdpSocket> {
    let local: SocketAddr = match server {
        SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
        SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
    };
    Ok(UdpSocket::bind(local).await?)
}

/// Turn a `host[:port]` target into a socket address, defaulting the port
/// to 1812.
pub async fn resolve_target(target: &str) -> ProbeResult<SocketAddr> {
    let target = target.trim();

    if let Ok(addr) = target.parse::<SocketAddr>() {
        return Ok(addr);
    }
    let bare = target
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(target);
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_AUTH_PORT));
    }

    let with_port = if target.contains(':') {
        target.to_string()
    } else {
        format!("{}:{}", target, DEFAULT_AUTH_PORT)
    };
    let mut addrs = lookup_host(&with_port).await.map_err(|e| {
        ProbeError::Configuration(format!("Cannot resolve target '{}': {}", target, e))
    })?;
    let addr = addrs
        .next()
        .ok_or_else(|| ProbeError::Configuration(format!("Target '{}' has no addresses", target)));
    addr
}
