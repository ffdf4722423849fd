//! Subscriber identity, flags, and owned subscription table.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::events::EventTable;
use crate::rules::Rules;

/// A notification recipient.
///
/// Identity is the `(contact, channel)` pair — an address the delivery
/// transport understands plus the name of that transport. An optional
/// numeric id can serve as an alternate identity for consumers that key
/// subscribers by their own ids.
///
/// The flags live in atomics because subscribers are handed out as
/// `Arc<Subscriber>` and may be updated while other threads hold a handle.
#[derive(Debug, Serialize, Deserialize)]
pub struct Subscriber {
    /// Optional numeric identity; zero means unset
    #[serde(default)]
    id: AtomicU64,
    /// Contact address understood by the delivery channel
    pub contact: String,
    /// Delivery channel identifier, matched against the registry allow-list
    pub channel: String,
    #[serde(default)]
    admin: AtomicBool,
    /// Ignored subscribers never appear in eligibility results
    #[serde(default)]
    ignored: AtomicBool,
    /// This subscriber's event subscriptions, each with its own cooldown
    #[serde(default)]
    pub events: EventTable,
}

impl Subscriber {
    pub fn new(
        contact: impl Into<String>,
        channel: impl Into<String>,
        admin: bool,
        ignored: bool,
    ) -> Self {
        Self {
            id: AtomicU64::new(0),
            contact: contact.into(),
            channel: channel.into(),
            admin: AtomicBool::new(admin),
            ignored: AtomicBool::new(ignored),
            events: EventTable::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id.load(Ordering::Relaxed)
    }

    pub fn set_id(&self, id: u64) {
        self.id.store(id, Ordering::Relaxed);
    }

    pub fn is_admin(&self) -> bool {
        self.admin.load(Ordering::Relaxed)
    }

    pub fn set_admin(&self, admin: bool) {
        self.admin.store(admin, Ordering::Relaxed);
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.load(Ordering::Relaxed)
    }

    pub fn set_ignored(&self, ignored: bool) {
        self.ignored.store(ignored, Ordering::Relaxed);
    }

    /// Subscribe to an event. The new subscription starts unpaused.
    ///
    /// Fails with [`RegistryError::EventExists`] if already subscribed.
    pub fn subscribe(&self, event: impl Into<String>) -> RegistryResult<()> {
        self.events.create(event, Some(Rules::started_now()))
    }

    /// Drop an event subscription.
    ///
    /// Fails with [`RegistryError::EventNotFound`] if not subscribed.
    pub fn unsubscribe(&self, event: &str) -> RegistryResult<()> {
        if self.events.remove(event) {
            Ok(())
        } else {
            Err(RegistryError::EventNotFound)
        }
    }

    /// Mute this subscription until `now + duration`; zero unmutes.
    pub fn pause(&self, event: &str, duration: Duration) -> RegistryResult<()> {
        self.events.pause(event, duration)
    }

    pub fn unpause(&self, event: &str) -> RegistryResult<()> {
        self.events.unpause(event)
    }

    /// Whether this subscription is muted. Events the subscriber never
    /// subscribed to report muted.
    pub fn is_paused(&self, event: &str) -> bool {
        self.events.is_paused(event)
    }

    /// Subscribed event names, sorted.
    pub fn subscriptions(&self) -> Vec<String> {
        self.events.names()
    }

    /// The subscription's rule list, sorted. Empty when not subscribed.
    ///
    /// List entries live in the subscription's string-rule map, each keyed
    /// by itself.
    pub fn rules(&self, event: &str) -> Vec<String> {
        self.events
            .with_rules(event, |rules| {
                let mut list: Vec<String> = rules.strings.keys().cloned().collect();
                list.sort();
                list
            })
            .unwrap_or_default()
    }

    /// Whether the subscription's rule list contains `rule`.
    pub fn rule_exists(&self, event: &str, rule: &str) -> bool {
        self.events
            .with_rules(event, |rules| rules.strings.contains_key(rule))
            .unwrap_or(false)
    }

    /// Replace the subscription's rule list.
    ///
    /// Fails with [`RegistryError::EventNotFound`] if not subscribed.
    pub fn replace_rules(&self, event: &str, rules: &[String]) -> RegistryResult<()> {
        self.events.with_rules_mut(event, |bag| {
            bag.strings = rules
                .iter()
                .map(|rule| (rule.clone(), rule.clone()))
                .collect();
        })
    }

    /// Append entries to the subscription's rule list.
    ///
    /// Fails with [`RegistryError::EventNotFound`] if not subscribed.
    pub fn add_rules(&self, event: &str, rules: &[String]) -> RegistryResult<()> {
        self.events.with_rules_mut(event, |bag| {
            for rule in rules {
                bag.strings.insert(rule.clone(), rule.clone());
            }
        })
    }

    /// Remove one entry from the subscription's rule list.
    ///
    /// Fails with [`RegistryError::EventNotFound`] if not subscribed.
    pub fn remove_rule(&self, event: &str, rule: &str) -> RegistryResult<()> {
        self.events.with_rules_mut(event, |bag| {
            bag.strings.remove(rule);
        })
    }
}
