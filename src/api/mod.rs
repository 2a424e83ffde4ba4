//! BookStore API client
//!
//! Thin typed wrapper over the service's JSON endpoints. Exact status codes
//! are part of the contract: anything else surfaces as
//! [`SuiteError::ApiContract`] carrying the server-provided message, with no
//! retry layer in between.

pub mod models;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::{ApiConfig, SuiteConfig};
use crate::error::SuiteError;
use models::{AddBooksRequest, BooksEnvelope, CollectionEnvelope, Credentials, IsbnEntry};

#[derive(Debug)]
pub struct BookStoreApi {
    http: reqwest::Client,
    base_url: Url,
}

impl BookStoreApi {
    pub fn new(config: &SuiteConfig) -> Result<Self, SuiteError> {
        let base_url = Url::parse(&config.api.base_url)
            .map_err(|err| SuiteError::Config(format!("invalid api base url: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(config.api.request_timeout())
            .build()?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, SuiteError> {
        self.base_url
            .join(path)
            .map_err(|err| SuiteError::Config(format!("invalid endpoint path {path}: {err}")))
    }

    /// `GET /BookStore/v1/Books`: 200 plus the full catalogue.
    pub async fn books(&self) -> Result<BooksEnvelope, SuiteError> {
        let url = self.endpoint(ApiConfig::BOOKS_PATH)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if status != StatusCode::OK {
            return Err(SuiteError::from_contract(status.as_u16(), &body));
        }
        serde_json::from_value(body)
            .map_err(|err| SuiteError::InvalidResponse(format!("books envelope: {err}")))
    }

    /// `POST /Account/v1/User`: 201 plus the new user id.
    pub async fn register_user(&self, credentials: &Credentials) -> Result<String, SuiteError> {
        let url = self.endpoint(ApiConfig::REGISTER_USER_PATH)?;
        debug!(username = %credentials.username, "registering user");
        let response = self.http.post(url).json(credentials).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if status != StatusCode::CREATED {
            return Err(SuiteError::from_contract(status.as_u16(), &body));
        }
        body.get("userID")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SuiteError::InvalidResponse("registration reply missing userID".into()))
    }

    /// `POST /Account/v1/GenerateToken`: 200 plus a bearer token.
    pub async fn generate_token(&self, credentials: &Credentials) -> Result<String, SuiteError> {
        let url = self.endpoint(ApiConfig::GENERATE_TOKEN_PATH)?;
        let response = self.http.post(url).json(credentials).send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if status != StatusCode::OK {
            return Err(SuiteError::from_contract(status.as_u16(), &body));
        }
        body.get("token")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| SuiteError::InvalidResponse("token reply missing token".into()))
    }

    /// `POST /BookStore/v1/Books` with bearer auth: adds the isbns to the
    /// user's collection and echoes them back as bare references. Returns
    /// the status alongside the envelope since the service answers 200 or
    /// 201 depending on deployment.
    pub async fn add_books(
        &self,
        user_id: &str,
        token: &str,
        isbns: &[&str],
    ) -> Result<(StatusCode, CollectionEnvelope), SuiteError> {
        let url = self.endpoint(ApiConfig::BOOKS_PATH)?;
        let payload = AddBooksRequest {
            user_id,
            collection_of_isbns: isbns.iter().copied().map(|isbn| IsbnEntry { isbn }).collect(),
        };

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() {
            return Err(SuiteError::from_contract(status.as_u16(), &body));
        }
        let envelope = serde_json::from_value(body)
            .map_err(|err| SuiteError::InvalidResponse(format!("add-books envelope: {err}")))?;
        Ok((status, envelope))
    }
}
