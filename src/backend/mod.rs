use anyhow::{Context, Result};
use reqwest::multipart;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capture::Artifact;
use crate::playback::AslTranslation;

/// Response of a transcription request: the recognized text plus its sign
/// translation, consumed opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscribeResponse {
    pub transcription: String,
    #[serde(default)]
    pub asl_translation: Option<AslTranslation>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Thin client for the remote transcription/translation service.
///
/// One request per call, no retry or ordering logic; failures surface as
/// errors for the caller to report.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Submit a finished artifact for transcription.
    pub async fn transcribe(
        &self,
        artifact: &Artifact,
        session_id: Option<&str>,
    ) -> Result<TranscribeResponse> {
        info!(
            bytes = artifact.len(),
            content_type = %artifact.content_type,
            "submitting artifact for transcription"
        );

        let part = multipart::Part::bytes(artifact.bytes.clone())
            .file_name("recording")
            .mime_str(&artifact.content_type)
            .context("invalid artifact content type")?;

        let mut form = multipart::Form::new().part("file", part);
        if let Some(id) = session_id {
            form = form.text("session_id", id.to_string());
        }

        let response = self
            .http
            .post(format!("{}/transcribe/", self.base_url))
            .multipart(form)
            .send()
            .await
            .context("transcription request failed")?
            .error_for_status()
            .context("transcription request rejected")?;

        let body: TranscribeResponse = response
            .json()
            .await
            .context("failed to parse transcription response")?;

        info!(
            chars = body.transcription.len(),
            signs = body
                .asl_translation
                .as_ref()
                .map(|t| t.signs.len())
                .unwrap_or(0),
            "transcription received"
        );

        Ok(body)
    }

    /// Translate text directly into a sign sequence.
    pub async fn translate(&self, text: &str) -> Result<AslTranslation> {
        let response = self
            .http
            .post(format!("{}/asl/translate/", self.base_url))
            .query(&[("text", text)])
            .send()
            .await
            .context("translation request failed")?
            .error_for_status()
            .context("translation request rejected")?;

        response
            .json()
            .await
            .context("failed to parse translation response")
    }
}
