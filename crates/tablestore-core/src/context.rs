//! Per-call cancellation/deadline context threaded through every Manager
//! entry point (SPEC_FULL §3 `RequestContext`, §5 "callers pass a
//! cancellation/deadline context").

use crate::error::TablestoreError;
use tokio::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: String,
    pub user: Option<String>,
    pub deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            user: None,
            deadline: None,
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Checked before every blocking call in the hot paths. Returns a
    /// `Cancelled` error if the deadline has already passed.
    pub fn check_deadline(&self) -> Result<(), TablestoreError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(TablestoreError::cancelled("deadline exceeded")
                    .with_context("request_id", self.request_id.clone()));
            }
        }
        Ok(())
    }
}
