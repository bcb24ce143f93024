//! Shared helpers: boot the gateway on an ephemeral port.

#![allow(dead_code, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use registration_gateway::api;
use registration_gateway::app_state::AppState;
use registration_gateway::domain::EventBus;
use registration_gateway::ledger::InMemoryLedger;
use registration_gateway::service::{RegistrationService, RetryPolicy};

/// A running gateway backed by an in-memory ledger.
pub struct TestServer {
    pub base_url: String,
    pub ws_url: String,
    pub service: Arc<RegistrationService>,
    pub http: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let service = Arc::new(RegistrationService::new(
            Arc::new(InMemoryLedger::new()),
            EventBus::new(256),
            RetryPolicy::new(10, Duration::from_millis(1)),
        ));
        let app = api::build_app(AppState::new(Arc::clone(&service)), Duration::from_secs(10));

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind ephemeral port");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            ws_url: format!("ws://{addr}/ws"),
            service,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Creates an event as `organizer` and returns its JSON representation.
    pub async fn create_event(
        &self,
        organizer: &str,
        capacity: u32,
        publish: bool,
    ) -> serde_json::Value {
        let Ok(response) = self
            .http
            .post(self.url("/api/v1/events"))
            .header("x-user-id", organizer)
            .json(&serde_json::json!({
                "title": "Integration meetup",
                "capacity": capacity,
                "publish": publish,
            }))
            .send()
            .await
        else {
            panic!("create request failed");
        };
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let Ok(body) = response.json::<serde_json::Value>().await else {
            panic!("create response body");
        };
        body
    }

    pub async fn post_as(&self, path: &str, user: &str) -> reqwest::Response {
        let Ok(response) = self
            .http
            .post(self.url(path))
            .header("x-user-id", user)
            .send()
            .await
        else {
            panic!("POST {path} failed");
        };
        response
    }

    pub async fn get_as(&self, path: &str, user: Option<&str>) -> reqwest::Response {
        let mut request = self.http.get(self.url(path));
        if let Some(user) = user {
            request = request.header("x-user-id", user);
        }
        let Ok(response) = request.send().await else {
            panic!("GET {path} failed");
        };
        response
    }
}

pub async fn json(response: reqwest::Response) -> serde_json::Value {
    let Ok(body) = response.json::<serde_json::Value>().await else {
        panic!("response body is not JSON");
    };
    body
}

pub fn event_id(event: &serde_json::Value) -> String {
    let Some(id) = event["id"].as_str() else {
        panic!("event has no id");
    };
    id.to_string()
}
