//! Typed client for the journal HTTP API, plus the recompute session built on it.

pub mod computer;
pub mod error;
pub mod recompute;
pub mod session;

pub use computer::{LocalComputer, PositionComputer};
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use recompute::{RecomputeSession, RecomputeState};
pub use session::Session;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::envelope::{Envelope, ResponseStatus};
use crate::config::Config;
use crate::domain::StoredPosition;
use crate::engine::{ComputeRequest, ComputedPosition};
use crate::filter::{SearchRequest, SearchResponse};

/// Body of `POST /v1/positions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePositionRequest {
    pub instrument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub position: ComputeRequest,
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn from_config(config: &Config, session: Session) -> Self {
        Self::new(config.api_base_url.clone(), session)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn compute_position(
        &self,
        request: &ComputeRequest,
    ) -> Result<ComputedPosition, ApiError> {
        self.send(self.client.post(self.url("/v1/positions/compute")).json(request))
            .await
    }

    pub async fn create_position(
        &self,
        request: &CreatePositionRequest,
    ) -> Result<StoredPosition, ApiError> {
        self.send(self.client.post(self.url("/v1/positions")).json(request))
            .await
    }

    pub async fn get_position(&self, id: Uuid) -> Result<StoredPosition, ApiError> {
        self.send(self.client.get(self.url(&format!("/v1/positions/{}", id))))
            .await
    }

    pub async fn search_positions(
        &self,
        request: &SearchRequest,
    ) -> Result<SearchResponse, ApiError> {
        self.send(self.client.post(self.url("/v1/positions/search")).json(request))
            .await
    }

    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.send(self.client.get(self.url("/v1/users/me"))).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the session token, send once and unwrap the response envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let builder = match self.session.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "api response");

        if (200..300).contains(&status) {
            let envelope: Envelope<T> =
                serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
            return match (envelope.status, envelope.data) {
                (ResponseStatus::Success, Some(data)) => Ok(data),
                (ResponseStatus::Success, None) => {
                    Err(ApiError::Decode("success envelope without data".into()))
                }
                (ResponseStatus::Error, _) => Err(ApiError::Rejected {
                    status,
                    message: envelope.message,
                    errors: envelope.errors,
                }),
            };
        }

        let envelope = serde_json::from_slice::<Envelope<serde_json::Value>>(&body).ok();
        let (message, errors) = match envelope {
            Some(envelope) => (Some(envelope.message), envelope.errors),
            None => (None, Vec::new()),
        };
        let err = ApiError::from_status(status, message, errors);
        if err.is_unauthorized() {
            self.session.sign_out();
        }
        warn!(status, "api request failed: {}", err);
        Err(err)
    }
}
