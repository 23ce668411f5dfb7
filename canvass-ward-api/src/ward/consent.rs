use std::sync::Arc;

use reqwest::multipart::{Form, Part};

use canvass_types::consent::{ConsentForm, ConsentFormId};

use crate::ward::{routes, ClientError, WardConnection};

#[derive(thiserror::Error, Debug)]
#[error("Could not list consent forms:\n  {message}")]
pub struct ListConsentFormsError {
    pub message: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Scan for consent form <{consent_form_id}> could not be uploaded:\n  {message}")]
pub struct UploadConsentScanError {
    pub consent_form_id: ConsentFormId,
    pub message: String,
}

pub struct ConsentForms {
    connection: Arc<WardConnection>,
}

impl ConsentForms {

    pub(super) fn new(connection: Arc<WardConnection>) -> Self {
        Self { connection }
    }

    #[tracing::instrument(skip(self), level="trace")]
    pub async fn list(&self) -> Result<Vec<ConsentForm>, ClientError<ListConsentFormsError>> {

        let url = routes::fetch_consent_forms(self.connection.base_url());

        let payload = self.connection.get(url).await
            .map_err(|cause| cause.into_client_error(|message| ListConsentFormsError { message }))?;

        serde_json::from_value::<Vec<ConsentForm>>(payload)
            .map_err(|cause| ClientError::InvalidResponse(format!("Failed to parse consent form rows:\n  {cause}")))
    }

    /// Uploads a scanned paper form as a multipart body with the form id
    /// alongside the file.
    #[tracing::instrument(skip(self, scan), level="trace")]
    pub async fn upload_scan(&self, consent_form_id: ConsentFormId, file_name: String, scan: Vec<u8>) -> Result<(), ClientError<UploadConsentScanError>> {

        let url = routes::upload_consent_scan(self.connection.base_url());

        let form = Form::new()
            .text("id", consent_form_id.to_string())
            .part("scan", Part::bytes(scan).file_name(file_name));

        self.connection.post_multipart(url, form).await
            .map_err(|cause| cause.into_client_error(|message| UploadConsentScanError { consent_form_id, message }))?;

        Ok(())
    }
}
