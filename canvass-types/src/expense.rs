use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::resources::Record;
use crate::ShortName;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpenseId(pub i64);

#[derive(thiserror::Error, Clone, Debug)]
#[error("Illegal ExpenseId: {value}")]
pub struct IllegalExpenseId {
    pub value: String,
}

impl From<i64> for ExpenseId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for ExpenseId {

    type Error = IllegalExpenseId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse::<i64>()
            .map(Self)
            .map_err(|_| IllegalExpenseId { value: String::from(value) })
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Submitted,
    Approved,
    Rejected,
    Reimbursed,
}

impl ShortName for ExpenseStatus {
    fn short_name(&self) -> &'static str {
        match self {
            ExpenseStatus::Submitted => "Submitted",
            ExpenseStatus::Approved => "Approved",
            ExpenseStatus::Rejected => "Rejected",
            ExpenseStatus::Reimbursed => "Reimbursed",
        }
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// An expense claim awaiting approval, as returned by the WARD expense endpoints.
///
/// Amounts are carried in cents to avoid floating-point money.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub claimant: String,
    pub description: String,
    pub amount_cents: i64,
    pub status: ExpenseStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl Record for Expense {
    type Id = ExpenseId;

    fn id(&self) -> ExpenseId {
        self.id
    }

    fn search_terms(&self) -> Vec<&str> {
        vec![
            &self.claimant,
            &self.description,
            self.status.short_name(),
        ]
    }
}
