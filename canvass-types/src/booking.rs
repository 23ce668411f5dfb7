use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::resources::Record;
use crate::ShortName;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub i64);

#[derive(thiserror::Error, Clone, Debug)]
#[error("Illegal BookingId: {value}")]
pub struct IllegalBookingId {
    pub value: String,
}

impl From<i64> for BookingId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<&str> for BookingId {

    type Error = IllegalBookingId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse::<i64>()
            .map(Self)
            .map_err(|_| IllegalBookingId { value: String::from(value) })
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Requested,
    Confirmed,
    Cancelled,
}

impl ShortName for BookingStatus {
    fn short_name(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "Requested",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

/// A venue booking request as returned by the WARD booking endpoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub venue: String,
    pub purpose: String,
    pub status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_at: OffsetDateTime,
}

impl Record for Booking {
    type Id = BookingId;

    fn id(&self) -> BookingId {
        self.id
    }

    fn search_terms(&self) -> Vec<&str> {
        vec![
            &self.venue,
            &self.purpose,
            self.status.short_name(),
        ]
    }
}
