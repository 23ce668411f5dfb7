use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::resources::Record;
use crate::ShortName;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NomineeId(pub i64);

#[derive(thiserror::Error, Clone, Debug)]
#[error("Illegal NomineeId: {value}")]
pub struct IllegalNomineeId {
    pub value: String,
}

impl From<i64> for NomineeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for NomineeId {

    type Error = IllegalNomineeId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse::<i64>()
            .map(Self)
            .map_err(|_| IllegalNomineeId { value: String::from(value) })
    }
}

impl fmt::Display for NomineeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NomineeStatus {
    Pending,
    Approved,
    Rejected,
    Disqualified,
}

impl ShortName for NomineeStatus {
    fn short_name(&self) -> &'static str {
        match self {
            NomineeStatus::Pending => "Pending",
            NomineeStatus::Approved => "Approved",
            NomineeStatus::Rejected => "Rejected",
            NomineeStatus::Disqualified => "Disqualified",
        }
    }
}

impl fmt::Display for NomineeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// Reason given by a staff member when rejecting or cancelling a record.
///
/// Constructing a `RejectionReason` is the client-side validation step:
/// an empty or oversized reason never reaches the network.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RejectionReason(pub(crate) String);

impl RejectionReason {

    pub const MAX_LENGTH: usize = 500;

    pub fn value(self) -> String {
        self.0
    }
}

#[derive(thiserror::Error, Clone, Debug)]
pub enum IllegalRejectionReason {
    #[error("A rejection reason may not be empty.")]
    Empty,
    #[error("Rejection reason is too long. Expected at most {expected} characters, got {actual}.")]
    TooLong { expected: usize, actual: usize },
}

impl From<RejectionReason> for String {
    fn from(value: RejectionReason) -> Self {
        value.0
    }
}

impl TryFrom<String> for RejectionReason {

    type Error = IllegalRejectionReason;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Err(IllegalRejectionReason::Empty)
        }
        else if trimmed.len() > Self::MAX_LENGTH {
            Err(IllegalRejectionReason::TooLong {
                expected: Self::MAX_LENGTH,
                actual: trimmed.len(),
            })
        }
        else {
            Ok(Self(String::from(trimmed)))
        }
    }
}

impl TryFrom<&str> for RejectionReason {

    type Error = IllegalRejectionReason;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RejectionReason::try_from(String::from(value))
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate nominee as returned by the WARD nominee endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nominee {
    pub id: NomineeId,
    pub name: String,
    pub constituency: String,
    pub category: String,
    pub status: NomineeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl Record for Nominee {
    type Id = NomineeId;

    fn id(&self) -> NomineeId {
        self.id
    }

    fn search_terms(&self) -> Vec<&str> {
        vec![
            &self.name,
            &self.constituency,
            &self.category,
            self.status.short_name(),
        ]
    }
}
