//! Token resolution and outcome classification.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rollcall_core::{CredentialStatus, DirectoryEntry, EntityKind, ResolutionResult, Token};
use rollcall_directory::TokenDirectory;
use tracing::{debug, warn};

/// Classify a directory answer.
///
/// - no entry → `Unknown`
/// - revoked → `Revoked`
/// - active teacher → `Teacher(id)`
/// - active student → `Student(id)`
pub fn classify(entry: Option<&DirectoryEntry>) -> ResolutionResult {
    match entry {
        None => ResolutionResult::Unknown,
        Some(entry) => match (entry.status, entry.kind) {
            (CredentialStatus::Revoked, _) => ResolutionResult::Revoked,
            (CredentialStatus::Active, EntityKind::Teacher) => {
                ResolutionResult::Teacher(entry.entity_id)
            }
            (CredentialStatus::Active, EntityKind::Student) => {
                ResolutionResult::Student(entry.entity_id)
            }
        },
    }
}

/// Maps admitted tokens to classified outcomes through a [`TokenDirectory`].
///
/// Nothing is cached: every call performs a fresh lookup.
#[derive(Debug)]
pub struct Resolver<D> {
    directory: Arc<D>,
    timeout: Duration,
}

impl<D> Clone for Resolver<D> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            timeout: self.timeout,
        }
    }
}

impl<D: TokenDirectory + 'static> Resolver<D> {
    /// Create a resolver bounding each lookup by `timeout`.
    pub fn new(directory: Arc<D>, timeout: Duration) -> Self {
        Self { directory, timeout }
    }

    /// Resolve `token`.
    ///
    /// The returned future owns everything it needs, so the session task can
    /// keep it pending while it handles other input, or drop it on teardown.
    /// Transport failures and lookups exceeding the timeout resolve as
    /// [`ResolutionResult::LookupFailed`].
    pub fn resolve(
        &self,
        token: Token,
    ) -> impl Future<Output = ResolutionResult> + Send + use<D> {
        let directory = Arc::clone(&self.directory);
        let timeout = self.timeout;

        async move {
            match tokio::time::timeout(timeout, directory.lookup(&token)).await {
                Ok(Ok(entry)) => {
                    let result = classify(entry.as_ref());
                    debug!(token = %token, result = %result, "Token classified");
                    result
                }
                Ok(Err(e)) => {
                    warn!(token = %token, error = %e, "Directory lookup failed");
                    ResolutionResult::LookupFailed
                }
                Err(_) => {
                    warn!(
                        token = %token,
                        timeout_ms = timeout.as_millis() as u64,
                        "Directory lookup timed out"
                    );
                    ResolutionResult::LookupFailed
                }
            }
        }
    }
}
