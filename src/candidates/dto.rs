use serde::{Deserialize, Serialize};

use super::{repo_types::Candidate, services::EditWindowStatus};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub email: String,
}

/// Answer to "do I already have a submission?". The record itself is only
/// returned while it can still be edited.
#[derive(Debug, Serialize)]
pub struct SubmissionStatusResponse {
    #[serde(flatten)]
    pub status: EditWindowStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate: Option<Candidate>,
}
