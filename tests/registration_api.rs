//! End-to-end tests of the REST surface against a live server.

#![allow(clippy::panic)]

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use registration_gateway::client::{
    AttemptOutcome, HttpTransport, OptimisticController, RegistrationState,
    RegistrationTransport,
};
use registration_gateway::domain::{Availability, EventId, RegistrationError, UserId};

use common::{TestServer, event_id, json};

fn user(name: &str) -> UserId {
    let Some(id) = UserId::parse(name) else {
        panic!("valid user id");
    };
    id
}

fn parse_event_id(raw: &str) -> EventId {
    let Ok(uuid) = raw.parse::<uuid::Uuid>() else {
        panic!("event id is a UUID");
    };
    EventId::from_uuid(uuid)
}

#[tokio::test]
async fn health_reports_healthy() {
    let server = TestServer::spawn().await;
    let body = json(server.get_as("/health", None).await).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn event_lifecycle_and_registration() {
    let server = TestServer::spawn().await;
    let event = server.create_event("org", 2, false).await;
    let id = event_id(&event);
    assert_eq!(event["status"], "draft");

    // Draft events refuse registrations.
    let response = server
        .post_as(&format!("/api/v1/events/{id}/registrations"), "alice")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    let body = json(response).await;
    assert_eq!(body["error"]["reason"], "event_not_published");
    assert_eq!(body["error"]["code"], 4002);

    // Only the organizer may publish.
    let response = server
        .post_as(&format!("/api/v1/events/{id}/publish"), "mallory")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    let response = server
        .post_as(&format!("/api/v1/events/{id}/publish"), "org")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(json(response).await["status"], "published");

    let response = server
        .post_as(&format!("/api/v1/events/{id}/registrations"), "alice")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let receipt = json(response).await;
    assert_eq!(receipt["event"]["registered_count"], 1);
    assert_eq!(receipt["registration"]["user_id"], "alice");

    let availability = json(
        server
            .get_as(&format!("/api/v1/events/{id}/availability"), None)
            .await,
    )
    .await;
    assert_eq!(availability["available"], 1);
    assert_eq!(availability["accepting"], true);

    let response = server
        .get_as(&format!("/api/v1/events/{id}/registrations"), Some("alice"))
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::FORBIDDEN);

    let listing = json(
        server
            .get_as(&format!("/api/v1/events/{id}/registrations"), Some("org"))
            .await,
    )
    .await;
    assert_eq!(listing["total"], 1);

    let response = server
        .post_as(&format!("/api/v1/events/{id}/close"), "org")
        .await;
    assert_eq!(json(response).await["status"], "closed");

    let response = server
        .post_as(&format!("/api/v1/events/{id}/close"), "org")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::CONFLICT);
    assert_eq!(json(response).await["error"]["code"], 2003);
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let server = TestServer::spawn().await;
    let Ok(response) = server
        .http
        .post(server.url("/api/v1/events"))
        .json(&serde_json::json!({ "title": "x", "capacity": 1 }))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::UNAUTHORIZED);
    assert_eq!(json(response).await["error"]["code"], 1002);
}

#[tokio::test]
async fn invalid_event_attributes_are_rejected() {
    let server = TestServer::spawn().await;
    for capacity in [0_u64, 3_000_000_000] {
        let Ok(response) = server
            .http
            .post(server.url("/api/v1/events"))
            .header("x-user-id", "org")
            .json(&serde_json::json!({ "title": "Sized", "capacity": capacity }))
            .send()
            .await
        else {
            panic!("request failed");
        };
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"]["code"], 1001);
    }
}

#[tokio::test]
async fn malformed_body_gets_structured_error() {
    let server = TestServer::spawn().await;
    let Ok(response) = server
        .http
        .post(server.url("/api/v1/events"))
        .header("x-user-id", "org")
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["error"]["code"], 1001);
    assert!(body["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test]
async fn list_filters_by_status_and_paginates() {
    let server = TestServer::spawn().await;
    for _ in 0..3 {
        server.create_event("org", 5, true).await;
    }
    server.create_event("org", 5, false).await;

    let body = json(
        server
            .get_as("/api/v1/events?status=published&per_page=2", None)
            .await,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["total_pages"], 2);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let response = server.get_as("/api/v1/events?status=archived", None).await;
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_event_is_not_found() {
    let server = TestServer::spawn().await;
    let missing = EventId::new();
    let response = server
        .get_as(&format!("/api/v1/events/{missing}"), None)
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = server
        .post_as(&format!("/api/v1/events/{missing}/registrations"), "alice")
        .await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"]["reason"], "not_found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_http_registrations_never_overbook() {
    let server = Arc::new(TestServer::spawn().await);
    let event = server.create_event("org", 5, true).await;
    let id = event_id(&event);

    let mut handles = Vec::new();
    for i in 0..20 {
        let server = Arc::clone(&server);
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            server
                .post_as(&format!("/api/v1/events/{id}/registrations"), &format!("user-{i}"))
                .await
                .status()
        }));
    }

    let mut created = 0;
    let mut full = 0;
    for handle in handles {
        let Ok(status) = handle.await else {
            panic!("task panicked");
        };
        match status {
            reqwest::StatusCode::CREATED => created += 1,
            reqwest::StatusCode::CONFLICT => full += 1,
            other => panic!("unexpected status {other}"),
        }
    }
    assert_eq!(created, 5);
    assert_eq!(full, 15);

    let listing = json(
        server
            .get_as(&format!("/api/v1/events/{id}/registrations"), Some("org"))
            .await,
    )
    .await;
    let Some(markers) = listing["data"].as_array() else {
        panic!("registrations array");
    };
    let users: HashSet<_> = markers
        .iter()
        .filter_map(|m| m["user_id"].as_str())
        .collect();
    assert_eq!(users.len(), 5);

    let availability = json(
        server
            .get_as(&format!("/api/v1/events/{id}/availability"), None)
            .await,
    )
    .await;
    assert_eq!(availability["registered_count"], 5);
    assert_eq!(availability["available"], 0);
}

#[tokio::test]
async fn http_transport_preserves_typed_errors() {
    let server = TestServer::spawn().await;
    let event = server.create_event("org", 1, true).await;
    let id = parse_event_id(&event_id(&event));
    let transport = HttpTransport::new(format!("{}/", server.base_url));

    let Ok(receipt) = transport.register(id, &user("alice")).await else {
        panic!("first registration should succeed");
    };
    assert_eq!(receipt.event.registered_count, 1);

    assert_eq!(
        transport.register(id, &user("alice")).await,
        Err(RegistrationError::AlreadyRegistered {
            event_id: id,
            user_id: user("alice"),
        })
    );
    assert_eq!(
        transport.register(id, &user("bob")).await,
        Err(RegistrationError::EventFull(id))
    );
    assert_eq!(
        transport.register(EventId::new(), &user("bob")).await.err().map(|e| e.code()),
        Some("not_found")
    );
}

#[tokio::test]
async fn controller_over_http_confirms_then_loses_race() {
    let server = TestServer::spawn().await;
    let event = server.create_event("org", 1, true).await;
    let id = parse_event_id(&event_id(&event));
    let transport = Arc::new(HttpTransport::new(server.base_url.clone()));

    let Ok(snapshot) = server
        .get_as(&format!("/api/v1/events/{id}/availability"), None)
        .await
        .json::<Availability>()
        .await
    else {
        panic!("availability body");
    };

    // Two clients both see one spot left.
    let alice = OptimisticController::new(
        Arc::clone(&transport),
        user("alice"),
        snapshot,
        Duration::from_secs(5),
    );
    let bob = OptimisticController::new(
        Arc::clone(&transport),
        user("bob"),
        snapshot,
        Duration::from_secs(5),
    );

    let Ok(pending) = alice.request_registration() else {
        panic!("alice request rejected");
    };
    assert_eq!(alice.speculative_available(), 0);
    assert!(matches!(pending.outcome().await, AttemptOutcome::Confirmed(_)));
    assert_eq!(alice.view().authoritative_available, 0);

    let Ok(pending) = bob.request_registration() else {
        panic!("bob request rejected");
    };
    assert_eq!(bob.speculative_available(), 0);
    assert_eq!(
        pending.outcome().await,
        AttemptOutcome::RolledBack(RegistrationError::EventFull(id))
    );
    let view = bob.view();
    assert_eq!(view.speculative_available, 1);
    assert_eq!(view.registration_state, RegistrationState::RolledBack);
    assert_eq!(view.failure_message(), Some("Sorry, this event is full."));
}
