use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resources::Record;
use crate::ShortName;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsentFormId(pub i64);

#[derive(thiserror::Error, Clone, Debug)]
#[error("Illegal ConsentFormId: {value}")]
pub struct IllegalConsentFormId {
    pub value: String,
}

impl From<i64> for ConsentFormId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for ConsentFormId {

    type Error = IllegalConsentFormId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse::<i64>()
            .map(Self)
            .map_err(|_| IllegalConsentFormId { value: String::from(value) })
    }
}

impl fmt::Display for ConsentFormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference printed on the paper form, used to match scans to submissions.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionReference(pub Uuid);

impl SubmissionReference {

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubmissionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsentFormStatus {
    Received,
    Verified,
    Archived,
}

impl ShortName for ConsentFormStatus {
    fn short_name(&self) -> &'static str {
        match self {
            ConsentFormStatus::Received => "Received",
            ConsentFormStatus::Verified => "Verified",
            ConsentFormStatus::Archived => "Archived",
        }
    }
}

impl fmt::Display for ConsentFormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// A signed consent form submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsentForm {
    pub id: ConsentFormId,
    pub reference: SubmissionReference,
    pub member_name: String,
    pub status: ConsentFormStatus,
}

impl Record for ConsentForm {
    type Id = ConsentFormId;

    fn id(&self) -> ConsentFormId {
        self.id
    }

    fn search_terms(&self) -> Vec<&str> {
        vec![
            &self.member_name,
            self.status.short_name(),
        ]
    }
}
