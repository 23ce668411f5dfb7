use std::sync::Arc;

use serde::Serialize;

use canvass_types::nominee::{Nominee, NomineeId, RejectionReason};

use crate::ward::{routes, ClientError, WardConnection};

#[derive(thiserror::Error, Debug)]
#[error("Could not list nominees:\n  {message}")]
pub struct ListNomineesError {
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Nominee <{nominee_id}> could not be approved:\n  {message}")]
pub struct ApproveNomineeError {
    pub nominee_id: NomineeId,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Nominee <{nominee_id}> could not be rejected:\n  {message}")]
pub struct RejectNomineeError {
    pub nominee_id: NomineeId,
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Nominee <{nominee_id}> could not be disqualified:\n  {message}")]
pub struct DisqualifyNomineeError {
    pub nominee_id: NomineeId,
    pub message: String,
}

pub struct Nominees {
    connection: Arc<WardConnection>,
}

impl Nominees {

    pub(super) fn new(connection: Arc<WardConnection>) -> Self {
        Self { connection }
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn list(&self) -> Result<Vec<Nominee>, ClientError<ListNomineesError>> {

        let url = routes::fetch_nominees(self.connection.base_url());

        let payload = self.connection.get(url).await
            .map_err(|cause| cause.into_client_error(|message| ListNomineesError { message }))?;

        serde_json::from_value::<Vec<Nominee>>(payload)
            .map_err(|cause| ClientError::InvalidResponse(format!("Failed to parse nominee rows:\n  {cause}")))
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn approve(&self, nominee_id: NomineeId) -> Result<(), ClientError<ApproveNomineeError>> {

        let url = routes::approve_nominee(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct ApproveNominee {
                id: NomineeId,
            }

            ApproveNominee {
                id: nominee_id,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| ApproveNomineeError { nominee_id, message }))?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn reject(&self, nominee_id: NomineeId, reason: RejectionReason) -> Result<(), ClientError<RejectNomineeError>> {

        let url = routes::reject_nominee(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct RejectNominee {
                id: NomineeId,
                reason: RejectionReason,
            }

            RejectNominee {
                id: nominee_id,
                reason,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| RejectNomineeError { nominee_id, message }))?;

        Ok(())
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn disqualify(&self, nominee_id: NomineeId) -> Result<(), ClientError<DisqualifyNomineeError>> {

        let url = routes::disqualify_nominee(self.connection.base_url());

        let body = {
            #[derive(Serialize, Debug)]
            struct DisqualifyNominee {
                id: NomineeId,
            }

            DisqualifyNominee {
                id: nominee_id,
            }
        };

        self.connection.post_json(url, &body).await
            .map_err(|cause| cause.into_client_error(|message| DisqualifyNomineeError { nominee_id, message }))?;

        Ok(())
    }
}
