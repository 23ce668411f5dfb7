use std::sync::Arc;

use serde::Serialize;

use canvass_types::booking::{Booking, BookingId};
use canvass_types::nominee::RejectionReason;

use crate::ward::{routes, ClientError, WardConnection};

#[derive(thiserror::Error, Debug)]
#[error("Could not list bookings:\n  {message}")]
pub struct ListBookingsError {
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Booking <{booking_id}> could not be confirmed:\n  {message}")]
pub struct ConfirmBookingError {
    pub booking_id: BookingId,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Booking <{booking_id}> could not be cancelled:\n  {message}")]
pub struct CancelBookingError {
    pub booking_id: BookingId,
    pub message: String,
}

pub struct Bookings {
    connection: Arc<WardConnection>,
}

impl Bookings {

    pub(super) fn new(connection: Arc<WardConnection>) -> Self {
        Self { connection }
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn list(&self) -> Result<Vec<Booking>, ClientError<ListBookingsError>> {

        let url = routes::fetch_bookings(self.connection.base_url());

        let payload = self.connection.get(url).await
            .map_err(|cause| cause.into_client_error(|message| ListBookingsError { message }))?;

        serde_json::from_value::<Vec<Booking>>(payload)
            .map_err(|cause| ClientError::InvalidResponse(format!("Failed to parse booking rows:\n  {cause}")))
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn confirm(&self, booking_id: BookingId) -> Result<(), ClientError<ConfirmBookingError>> {

        let url = routes::confirm_booking(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct ConfirmBooking {
                id: BookingId,
            }

            ConfirmBooking {
                id: booking_id,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| ConfirmBookingError { booking_id, message }))?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn cancel(&self, booking_id: BookingId, reason: RejectionReason) -> Result<(), ClientError<CancelBookingError>> {

        let url = routes::cancel_booking(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct CancelBooking {
                id: BookingId,
                reason: RejectionReason,
            }

            CancelBooking {
                id: booking_id,
                reason,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| CancelBookingError { booking_id, message }))?;

        Ok(())
    }
}
