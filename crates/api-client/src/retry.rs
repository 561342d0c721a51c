//! Exponential-backoff retry for transport failures
//!
//! Only failures to obtain a response are retried (timeouts, refused or reset
//! connections, DNS lookups). Any response, whatever its status, ends the loop.
//!
//! Schedule: before attempt `n + 1` the loop sleeps `base_delay * 2^(n - 1)`,
//! so the default policy waits 1s, 2s, 4s across four attempts. There is no
//! sleep after the final attempt.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Retry budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each retry after that
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Sleep between failed attempt `attempt` (1-based) and the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// Distinguishes transient failures from fatal ones.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Terminal outcome of `retry`.
#[derive(Debug)]
pub enum RetryError<E> {
    /// A non-retryable failure; no further attempts were made
    Fatal(E),
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Fatal(_) => 1,
            RetryError::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Run `operation` until it succeeds, fails fatally, or the budget runs out.
///
/// `operation` receives the 1-based attempt number.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> std::result::Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Retryable + fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                debug!(attempt, error = %e, "non-retryable failure");
                return Err(RetryError::Fatal(e));
            }
            Err(e) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted { attempts: attempt, last: e });
            }
            Err(e) => {
                let delay = policy.delay_after(attempt);
                warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "network error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Substrings of transport errors that indicate a transient name-resolution
/// or network condition.
const TRANSIENT_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "no such host",
    "temporary failure",
];

/// Socket-level failures worth another attempt.
const TRANSIENT_IO_KINDS: &[std::io::ErrorKind] = &[
    std::io::ErrorKind::ConnectionRefused,
    std::io::ErrorKind::ConnectionReset,
    std::io::ErrorKind::TimedOut,
];

/// Timeouts, refused or reset connections, and DNS failures are retried.
/// Other connect-phase failures (TLS handshake, protocol mismatch) are fatal.
impl Retryable for reqwest::Error {
    fn is_retryable(&self) -> bool {
        self.is_timeout() || chain_is_transient(self)
    }
}

fn chain_is_transient(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>()
            && TRANSIENT_IO_KINDS.contains(&io.kind())
        {
            return true;
        }
        let text = e.to_string().to_ascii_lowercase();
        if TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker)) {
            return true;
        }
        current = e.source();
    }
    false
}

/// Render an error with its full source chain, `outer: inner: root`.
fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut current = err.source();
    while let Some(e) = current {
        text.push_str(": ");
        text.push_str(&e.to_string());
        current = e.source();
    }
    text
}

#[derive(Debug)]
enum SendError {
    Transport(reqwest::Error),
    /// Streaming bodies cannot be replayed
    NotReplayable,
}

impl fmt::Display for SendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendError::Transport(e) => write!(f, "{}", describe(e)),
            SendError::NotReplayable => write!(f, "request body cannot be replayed"),
        }
    }
}

impl Retryable for SendError {
    fn is_retryable(&self) -> bool {
        match self {
            SendError::Transport(e) => e.is_retryable(),
            SendError::NotReplayable => false,
        }
    }
}

/// Execute `request`, retrying transport failures per `policy`.
///
/// Returns the first response received regardless of status.
pub async fn send(
    client: &reqwest::Client,
    request: reqwest::Request,
    policy: &RetryPolicy,
) -> Result<reqwest::Response> {
    let method = request.method().clone();
    let url = request.url().clone();
    debug!(%method, %url, "sending request");

    let outcome = retry(policy, |_attempt| {
        let next = request.try_clone();
        let client = client.clone();
        async move {
            let next = next.ok_or(SendError::NotReplayable)?;
            client.execute(next).await.map_err(SendError::Transport)
        }
    })
    .await;

    match outcome {
        Ok(response) => {
            debug!(%method, %url, status = response.status().as_u16(), "response received");
            Ok(response)
        }
        Err(RetryError::Exhausted { attempts, last }) => Err(Error::Network {
            attempts,
            message: last.to_string(),
        }),
        Err(RetryError::Fatal(e)) => Err(Error::Http(e.to_string())),
    }
}
