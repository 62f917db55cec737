//! Polling of asynchronous conversions.
//!
//! The document service answers an asynchronous request with its progress.
//! Re-sending the same request (same revision key) returns the current
//! progress until the result is ready.

use std::time::Duration;

use coedit_core::RevisionKey;
use url::Url;

use crate::{
    ConversionRequest, ConversionResponse, ConversionService, Error, Result, TRACING_TARGET,
};

/// Default number of polls before a conversion is given up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 20;

/// Default pause between two polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How a [`ConversionJob`] is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Polls after which an unfinished conversion fails.
    pub max_attempts: u32,
    /// Pause between two polls.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollPolicy {
    /// Creates a poll policy.
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Where a conversion job stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionState {
    /// Created, not sent yet.
    Requested,
    /// Accepted by the document service.
    InProgress { percent: u8 },
    /// Finished; the result can be downloaded.
    Complete { file_url: Url },
    /// Gave up or was rejected.
    Failed { reason: String },
}

impl ConversionState {
    /// Returns whether the job can no longer change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Failed { .. })
    }
}

/// An asynchronous conversion tracked until it finishes.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    request: ConversionRequest,
    state: ConversionState,
    attempts: u32,
}

impl ConversionJob {
    /// Creates a job for `request`, which is switched to asynchronous mode.
    pub fn new(request: ConversionRequest) -> Self {
        Self {
            request: request.with_async(true),
            state: ConversionState::Requested,
            attempts: 0,
        }
    }

    /// Returns the request being polled.
    pub fn request(&self) -> &ConversionRequest {
        &self.request
    }

    /// Returns the revision key identifying the job at the document service.
    pub fn revision_key(&self) -> &RevisionKey {
        &self.request.revision_key
    }

    /// Returns the current state.
    pub fn state(&self) -> &ConversionState {
        &self.state
    }

    /// Returns how many times the document service was asked.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Asks the document service for progress once.
    ///
    /// Terminal jobs are returned as they are without a call. A failing call
    /// moves the job to [`ConversionState::Failed`] and returns the error.
    pub async fn poll(&mut self, service: &ConversionService) -> Result<&ConversionState> {
        if self.state.is_terminal() {
            return Ok(&self.state);
        }

        self.attempts += 1;
        let result = service.convert(&self.request).await.and_then(next_state);

        match result {
            Ok(state) => {
                tracing::trace!(
                    target: TRACING_TARGET,
                    revision_key = %self.request.revision_key,
                    attempt = self.attempts,
                    state = ?state,
                    "Conversion polled"
                );
                self.state = state;
                Ok(&self.state)
            }
            Err(error) => {
                self.state = ConversionState::Failed {
                    reason: error.to_string(),
                };
                Err(error)
            }
        }
    }

    /// Polls until the conversion finishes and returns the result URL.
    ///
    /// # Errors
    ///
    /// Fails with the first polling error, or with
    /// [`ErrorKind::ConversionTransport`](crate::ErrorKind::ConversionTransport)
    /// once `policy.max_attempts` polls did not finish the job.
    pub async fn wait(&mut self, service: &ConversionService, policy: PollPolicy) -> Result<Url> {
        loop {
            if let ConversionState::Failed { reason } = &self.state {
                return Err(Error::conversion_transport()
                    .with_message(reason.clone())
                    .with_context(format!("revision {}", self.request.revision_key)));
            }

            if self.attempts >= policy.max_attempts && !self.state.is_terminal() {
                let reason = format!("conversion unfinished after {} polls", self.attempts);
                tracing::warn!(
                    target: TRACING_TARGET,
                    revision_key = %self.request.revision_key,
                    attempts = self.attempts,
                    "Giving up on conversion"
                );
                self.state = ConversionState::Failed {
                    reason: reason.clone(),
                };
                return Err(Error::conversion_transport()
                    .with_message(reason)
                    .with_context(format!("revision {}", self.request.revision_key)));
            }

            match self.poll(service).await?.clone() {
                ConversionState::Complete { file_url } => return Ok(file_url),
                ConversionState::InProgress { .. } if self.attempts < policy.max_attempts => {
                    tokio::time::sleep(policy.interval).await;
                }
                _ => {}
            }
        }
    }
}

fn next_state(response: ConversionResponse) -> Result<ConversionState> {
    if !response.is_complete() {
        let percent = response.percent;
        return Ok(ConversionState::InProgress { percent });
    }

    let file_url = response.into_file_url()?;
    Ok(ConversionState::Complete { file_url })
}
