//! Transport to the prediction service.

use std::future::Future;

use reqwest::multipart::{Form, Part};
use reqwest::Url;
use serde::Deserialize;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::intake::SelectedFile;
use crate::model::{parse_response, ServiceResponse};

/// Multipart field the service reads the image from.
pub const FILE_FIELD: &str = "file";

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Anything that can classify a selected file.
pub trait PredictionService {
    fn predict(
        &self,
        file: &SelectedFile,
    ) -> impl Future<Output = Result<ServiceResponse, ClientError>> + Send;
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

/// Talks to the service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPredictionService {
    client: reqwest::Client,
    predict_url: Url,
    health_url: Url,
}

impl HttpPredictionService {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            predict_url: config.predict_url.clone(),
            health_url: config.health_url(),
        })
    }

    pub fn predict_url(&self) -> &Url {
        &self.predict_url
    }

    /// Probe `GET /health`; true when the service reports `OK`.
    pub async fn check_health(&self) -> Result<bool, ClientError> {
        let response = self.client.get(self.health_url.clone()).send().await?;

        if !response.status().is_success() {
            log::warn!("{} answered {}", self.health_url, response.status());
            return Ok(false);
        }

        let body: HealthResponse = response.json().await?;
        Ok(body.status.eq_ignore_ascii_case("ok"))
    }
}

/// Multipart part for the upload. A declared type that is not a well-formed
/// MIME type is sent as `application/octet-stream`.
fn file_part(file: &SelectedFile) -> Part {
    let part = || Part::bytes(file.bytes.clone()).file_name(file.name.clone());
    match part().mime_str(&file.media_type) {
        Ok(part) => part,
        Err(e) => {
            log::warn!(
                "{} declares '{}' ({}), uploading as {}",
                file.name,
                file.media_type,
                e,
                FALLBACK_MEDIA_TYPE
            );
            part()
                .mime_str(FALLBACK_MEDIA_TYPE)
                .unwrap_or_else(|_| part())
        }
    }
}

impl PredictionService for HttpPredictionService {
    async fn predict(&self, file: &SelectedFile) -> Result<ServiceResponse, ClientError> {
        let form = Form::new().part(FILE_FIELD, file_part(file));

        log::info!(
            "Posting {} ({} bytes) to {}",
            file.name,
            file.size(),
            self.predict_url
        );

        let response = self
            .client
            .post(self.predict_url.clone())
            .multipart(form)
            .send()
            .await?;

        // Status is informational only, the body decides the outcome
        let status = response.status();
        let body = response.text().await?;
        log::debug!("{} answered {} with {} bytes", self.predict_url, status, body.len());

        parse_response(&body)
    }
}
