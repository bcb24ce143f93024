//! Per-connection subscription manager.
//!
//! Tracks which event IDs a WebSocket client follows and provides
//! server-side filtering of the domain event stream.

use std::collections::HashSet;

use crate::domain::EventId;

/// Subscription set for a single WebSocket connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed event IDs. Ignored while `subscribe_all` is set.
    event_ids: HashSet<EventId>,
    /// Wildcard `"*"` subscription.
    subscribe_all: bool,
}

/// Result of parsing client-supplied ID strings.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParsedIds {
    /// Valid event IDs.
    pub ids: Vec<EventId>,
    /// Whether `"*"` was present.
    pub wildcard: bool,
    /// Entries that were neither `"*"` nor a UUID.
    pub invalid: Vec<String>,
}

impl ParsedIds {
    /// Splits raw strings into IDs, wildcard, and rejects.
    #[must_use]
    pub fn parse(raw: &[String]) -> Self {
        let mut parsed = Self::default();
        for s in raw {
            if s == "*" {
                parsed.wildcard = true;
            } else if let Ok(uuid) = s.parse::<uuid::Uuid>() {
                parsed.ids.push(EventId::from_uuid(uuid));
            } else {
                parsed.invalid.push(s.clone());
            }
        }
        parsed
    }
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds event IDs to the set; `wildcard` enables the catch-all.
    pub fn subscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.event_ids.extend(ids.iter().copied());
    }

    /// Removes event IDs; `wildcard` drops the catch-all.
    pub fn unsubscribe(&mut self, ids: &[EventId], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for id in ids {
            self.event_ids.remove(id);
        }
    }

    /// Returns `true` if events for `event_id` should be forwarded.
    #[must_use]
    pub fn matches(&self, event_id: EventId) -> bool {
        self.subscribe_all || self.event_ids.contains(&event_id)
    }

    /// Number of explicitly subscribed event IDs.
    #[must_use]
    pub fn count(&self) -> usize {
        self.event_ids.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub const fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
