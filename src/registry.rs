//! The registry: channel allow-list, global events, and the subscriber list.
//!
//! # Locking
//!
//! The subscriber list and the channel allow-list sit behind registry-level
//! reader/writer locks; every event table carries its own. Multi-entity
//! sweeps (`event_remove`, `get_subscribers`) hold at most one lock at a
//! time, so an unrelated subscriber can be mutated mid-sweep — low
//! contention is traded for cross-entity snapshot consistency.

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::events::EventTable;
use crate::subscriber::Subscriber;

/// The top-level registry of events, channels, and subscribers.
///
/// All methods take `&self` and are safe to call from multiple threads.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Registry {
    /// Channels eligible for delivery; empty means every channel is allowed
    #[serde(default)]
    channels: RwLock<Vec<String>>,
    /// Globally declared events and their rules
    #[serde(default)]
    pub events: EventTable,
    /// All known subscribers, in creation order
    #[serde(default)]
    subscribers: RwLock<Vec<Arc<Subscriber>>>,
    /// Bound state file, if any
    #[serde(skip)]
    pub(crate) state_file: Mutex<Option<PathBuf>>,
}

impl Registry {
    /// An empty in-memory registry with no bound state file.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowed_channels(&self) -> Vec<String> {
        self.channels.read().clone()
    }

    /// Replace the channel allow-list. Order is preserved; an empty list
    /// allows every channel.
    pub fn set_allowed_channels(&self, channels: Vec<String>) {
        *self.channels.write() = channels;
    }

    /// Create a subscriber, or update the flags of the existing one with
    /// the same `(contact, channel)` identity.
    pub fn create_sub(
        &self,
        contact: &str,
        channel: &str,
        admin: bool,
        ignored: bool,
    ) -> Arc<Subscriber> {
        let mut subscribers = self.subscribers.write();
        if let Some(sub) = subscribers
            .iter()
            .find(|sub| sub.contact == contact && sub.channel == channel)
        {
            sub.set_admin(admin);
            sub.set_ignored(ignored);
            return Arc::clone(sub);
        }

        debug!("new subscriber {contact} on channel {channel}");
        let sub = Arc::new(Subscriber::new(contact, channel, admin, ignored));
        subscribers.push(Arc::clone(&sub));
        sub
    }

    /// Look up a subscriber by contact and channel.
    pub fn get_subscriber(&self, contact: &str, channel: &str) -> RegistryResult<Arc<Subscriber>> {
        self.subscribers
            .read()
            .iter()
            .find(|sub| sub.contact == contact && sub.channel == channel)
            .cloned()
            .ok_or(RegistryError::SubscriberNotFound)
    }

    /// Look up a subscriber by numeric id and channel. An unset id (zero)
    /// never matches.
    pub fn get_subscriber_by_id(&self, id: u64, channel: &str) -> RegistryResult<Arc<Subscriber>> {
        if id == 0 {
            return Err(RegistryError::SubscriberNotFound);
        }
        self.subscribers
            .read()
            .iter()
            .find(|sub| sub.id() == id && sub.channel == channel)
            .cloned()
            .ok_or(RegistryError::SubscriberNotFound)
    }

    /// Subscribers with the admin flag, in creation order.
    pub fn get_admins(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers
            .read()
            .iter()
            .filter(|sub| sub.is_admin())
            .cloned()
            .collect()
    }

    /// Subscribers with the ignored flag, in creation order.
    pub fn get_ignored(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers
            .read()
            .iter()
            .filter(|sub| sub.is_ignored())
            .cloned()
            .collect()
    }

    /// Every subscriber, in creation order.
    pub fn get_all_subscribers(&self) -> Vec<Arc<Subscriber>> {
        self.subscribers.read().to_vec()
    }

    /// Remove an event everywhere: from the global table and from every
    /// subscriber's subscriptions. Returns how many subscriptions were
    /// dropped.
    ///
    /// Each table locks independently — a subscription created for `name`
    /// while the sweep runs may survive it, but no single table is ever
    /// left inconsistent.
    pub fn event_remove(&self, name: &str) -> usize {
        self.events.remove(name);
        let removed = self
            .get_all_subscribers()
            .iter()
            .filter(|sub| sub.events.remove(name))
            .count();
        debug!("removed event {name} and {removed} subscriptions");
        removed
    }

    /// Subscribers currently eligible for a notification of `event`, in
    /// creation order.
    ///
    /// A subscriber qualifies when it is not ignored, its channel passes
    /// the allow-list, and its own table does not report the event paused —
    /// which also filters out subscribers with no subscription at all.
    /// Call this when your event fires and hand the result to your
    /// delivery transports.
    pub fn get_subscribers(&self, event: &str) -> Vec<Arc<Subscriber>> {
        let allowed = self.allowed_channels();
        self.get_all_subscribers()
            .into_iter()
            .filter(|sub| {
                !sub.is_ignored()
                    && channel_allowed(&allowed, &sub.channel)
                    && !sub.is_paused(event)
            })
            .collect()
    }

    /// Replace this registry's data with another's, one field at a time.
    pub(crate) fn adopt(&self, other: Registry) {
        *self.channels.write() = other.channels.into_inner();
        self.events.adopt(other.events);
        *self.subscribers.write() = other.subscribers.into_inner();
    }
}

/// Allow-list check: an empty list allows everything, the literal `"all"`
/// and `"any"` entries allow everything, and an entry matches any channel
/// it equals or prefixes.
fn channel_allowed(allowed: &[String], channel: &str) -> bool {
    if allowed.is_empty() {
        return true;
    }
    allowed
        .iter()
        .any(|entry| entry == channel || channel.starts_with(entry.as_str()) || entry == "all" || entry == "any")
}
