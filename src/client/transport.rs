//! Transports carrying a registration request from a client controller to
//! the registration service.

use std::fmt;

use async_trait::async_trait;

use crate::api::auth::USER_ID_HEADER;
use crate::domain::{EventId, RegistrationError, RegistrationReceipt, UserId};
use crate::error::ErrorResponse;
use crate::service::RegistrationService;

/// Issues one authoritative registration call.
///
/// Implementations must report every failure as a typed
/// [`RegistrationError`]; anything the transport itself cannot classify is a
/// [`RegistrationError::TransportFailure`].
#[async_trait]
pub trait RegistrationTransport: Send + Sync + fmt::Debug {
    /// Registers `user_id` for `event_id`.
    ///
    /// # Errors
    ///
    /// Any [`RegistrationError`] reported by the service or the transport.
    async fn register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, RegistrationError>;
}

/// In-process transport: call the service directly.
#[async_trait]
impl RegistrationTransport for RegistrationService {
    async fn register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        RegistrationService::register(self, event_id, user_id).await
    }
}

/// Remote transport speaking the gateway's REST API.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a transport for the gateway at `base_url`
    /// (e.g. `http://localhost:3000`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Creates a transport reusing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn registrations_url(&self, event_id: EventId) -> String {
        format!("{}/api/v1/events/{event_id}/registrations", self.base_url)
    }
}

#[async_trait]
impl RegistrationTransport for HttpTransport {
    async fn register(
        &self,
        event_id: EventId,
        user_id: &UserId,
    ) -> Result<RegistrationReceipt, RegistrationError> {
        let response = self
            .client
            .post(self.registrations_url(event_id))
            .header(USER_ID_HEADER, user_id.as_str())
            .send()
            .await
            .map_err(|e| RegistrationError::TransportFailure(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<RegistrationReceipt>().await.map_err(|e| {
                RegistrationError::TransportFailure(format!("undecodable receipt: {e}"))
            });
        }

        let body = response.json::<ErrorResponse>().await.map_err(|e| {
            RegistrationError::TransportFailure(format!("HTTP {status} with unreadable body: {e}"))
        })?;

        Err(match body.error.reason {
            Some(code) => RegistrationError::from_code(&code, event_id, user_id, &body.error.message),
            None => RegistrationError::TransportFailure(format!(
                "HTTP {status}: {}",
                body.error.message
            )),
        })
    }
}
