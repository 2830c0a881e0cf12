//! Thin adapters between the host's write validation points and the block
//! gate. Every adapter asks the same boolean question and only translates
//! a positive answer into its protocol's rejection.

use crate::blocks::{BlockGate, GateError};
use crate::model::account::{AccountId, Principal};
use std::sync::Arc;

/// Commit received on a push.
#[derive(Debug)]
pub struct CommitReceived {
    pub project: String,
    pub ref_name: String,
    pub commit: String,
}

/// Ref created, updated or deleted.
#[derive(Debug)]
pub struct RefReceived {
    pub project: String,
    pub ref_name: String,
}

/// Upload negotiation about to start on a fetch.
#[derive(Debug)]
pub struct PreUpload {
    pub project: String,
    pub wants: Vec<String>,
}

/// Assignee about to change on a review.
#[derive(Debug)]
pub struct AssigneeChange {
    pub change: u64,
    pub assignee: AccountId,
}

/// Hashtags about to change on a review.
#[derive(Debug)]
pub struct HashtagChange {
    pub change: u64,
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

#[derive(Debug)]
pub enum ValidationError {
    /// The operation is rejected with the configured message.
    Rejected(String),
    /// The block state could not be evaluated.
    Gate(GateError),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected(message) => f.write_str(message),
            Self::Gate(inner) => inner.fmt(f),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<GateError> for ValidationError {
    fn from(value: GateError) -> Self {
        Self::Gate(value)
    }
}

/// The five host validation listeners collapsed onto one decision
/// function.
pub struct WriteValidator {
    gate: Arc<BlockGate>,
}

impl WriteValidator {
    pub fn new(gate: Arc<BlockGate>) -> Self {
        Self { gate }
    }

    async fn reject_if_blocked(&self, principal: &Principal) -> Result<(), ValidationError> {
        if self.gate.is_blocked(principal).await? {
            Err(ValidationError::Rejected(self.gate.message().to_string()))
        } else {
            Ok(())
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn on_commit_received(
        &self,
        principal: &Principal,
        event: &CommitReceived,
    ) -> Result<(), ValidationError> {
        tracing::debug!(
            "validating commit {} for {} on {}",
            event.commit,
            event.ref_name,
            event.project
        );
        self.reject_if_blocked(principal).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn on_ref_operation(
        &self,
        principal: &Principal,
        event: &RefReceived,
    ) -> Result<(), ValidationError> {
        tracing::debug!("validating operation on {} for {}", event.ref_name, event.project);
        self.reject_if_blocked(principal).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn on_pre_upload(
        &self,
        principal: &Principal,
        event: &PreUpload,
    ) -> Result<(), ValidationError> {
        tracing::debug!(
            "validating upload of {} objects from {}",
            event.wants.len(),
            event.project
        );
        self.reject_if_blocked(principal).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn validate_assignee(
        &self,
        principal: &Principal,
        event: &AssigneeChange,
    ) -> Result<(), ValidationError> {
        tracing::debug!("validating assignee {} on change {}", event.assignee, event.change);
        self.reject_if_blocked(principal).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn validate_hashtags(
        &self,
        principal: &Principal,
        event: &HashtagChange,
    ) -> Result<(), ValidationError> {
        tracing::debug!(
            "validating {} added and {} removed hashtags on change {}",
            event.to_add.len(),
            event.to_remove.len(),
            event.change
        );
        self.reject_if_blocked(principal).await
    }
}
