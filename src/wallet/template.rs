//! TemplateSource - where the handshake gets its unsigned PSBT

use crate::core::paths::api;
use crate::mint::{MintData, MintPsbtRequest, MintPsbtResponse};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuilderError {
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("Server did not return a valid PSBT")]
    MissingPsbt,
    #[error("Could not reach the mint server: {0}")]
    Transport(String),
    #[error("Could not build the mint PSBT: {0}")]
    Rejected(String),
}

/// Parameters for one template request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRequest {
    pub fee_rate: u64,
    pub mint_data: MintData,
    pub address: String,
}

#[async_trait(?Send)]
pub trait TemplateSource {
    /// Fetch the hex-encoded unsigned template
    async fn fetch_template(&self, request: &TemplateRequest) -> Result<String, BuilderError>;
}

/// `POST {base_url}/api/create-mint-psbt`
#[derive(Debug, Clone)]
pub struct HttpTemplateSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTemplateSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string(), client: reqwest::Client::new() }
    }

    pub fn endpoint(&self) -> String { format!("{}{}", self.base_url, api::CREATE_MINT_PSBT) }
}

#[async_trait(?Send)]
impl TemplateSource for HttpTemplateSource {
    async fn fetch_template(&self, request: &TemplateRequest) -> Result<String, BuilderError> {
        let body = MintPsbtRequest::new(request.fee_rate, &request.mint_data, request.address.clone());
        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| BuilderError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| BuilderError::Transport(e.to_string()))?;
        let parsed = serde_json::from_str::<MintPsbtResponse>(&text).ok();
        debug!(status = status.as_u16(), "mint server responded");

        if !status.is_success() {
            let message = parsed
                .and_then(|r| r.error)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            return Err(BuilderError::Status { status: status.as_u16(), message });
        }
        match parsed {
            Some(MintPsbtResponse { success: true, psbt: Some(psbt), .. }) if is_psbt_hex(&psbt) => Ok(psbt),
            _ => Err(BuilderError::MissingPsbt),
        }
    }
}

/// Non-empty hex that decodes to something starting with the PSBT magic
fn is_psbt_hex(psbt: &str) -> bool {
    hex::decode(psbt).map(|bytes| bytes.starts_with(b"psbt\xff")).unwrap_or(false)
}

/// Builds templates in-process, without a server round trip
#[cfg(feature = "bitcoin")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTemplateSource {
    builder: crate::psbt::PsbtBuilder,
}

#[cfg(feature = "bitcoin")]
impl LocalTemplateSource {
    pub fn new(builder: crate::psbt::PsbtBuilder) -> Self { Self { builder } }
}

#[cfg(feature = "bitcoin")]
#[async_trait(?Send)]
impl TemplateSource for LocalTemplateSource {
    async fn fetch_template(&self, request: &TemplateRequest) -> Result<String, BuilderError> {
        self.builder
            .build_mint_template(request.fee_rate, &request.mint_data.to_string(), &request.address)
            .map(|template| template.hex())
            .map_err(|e| BuilderError::Rejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(HttpTemplateSource::new("http://localhost:3001/").endpoint(), "http://localhost:3001/api/create-mint-psbt");
    }

    #[test]
    fn test_psbt_hex_check() {
        assert!(is_psbt_hex("70736274ff0100"));
        assert!(!is_psbt_hex(""));
        assert!(!is_psbt_hex("not hex"));
        assert!(!is_psbt_hex("deadbeef"));
    }
}
