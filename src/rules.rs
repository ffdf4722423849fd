//! Typed rule metadata attached to events and subscriptions.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Arbitrary typed metadata carried by an event or a subscription, plus the
/// cooldown marker consulted by the eligibility query.
///
/// The registry stores and returns rule values but attaches no meaning to
/// them; consumers use the four maps however they like (thresholds, message
/// templates, last-sent markers, ...). Only `pause` matters to the registry
/// itself.
///
/// `Rules` carries no lock of its own. Every instance is owned by an
/// [`EventTable`](crate::events::EventTable) entry and is only reached
/// through that table's methods, under that table's lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    /// Notifications are muted until this instant. `None` means never muted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause: Option<DateTime<Utc>>,
    /// Duration-valued rules
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub durations: HashMap<String, Duration>,
    /// Integer-valued rules
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub ints: HashMap<String, i64>,
    /// String-valued rules
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub strings: HashMap<String, String>,
    /// Timestamp-valued rules
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub timestamps: HashMap<String, DateTime<Utc>>,
}

impl Rules {
    /// A bag whose cooldown marker is stamped to "now", i.e. not paused.
    pub(crate) fn started_now() -> Self {
        Self {
            pause: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Mute until `now + duration`. A zero duration unmutes immediately.
    pub fn pause_for(&mut self, duration: Duration) {
        self.pause = Some(Utc::now() + duration);
    }

    /// Whether the cooldown marker lies in the future.
    pub fn is_paused(&self) -> bool {
        match self.pause {
            Some(until) => until > Utc::now(),
            None => false,
        }
    }

    /// Remove a rule name from every typed map. The caller does not need to
    /// know which type the rule was stored under.
    pub fn delete_rule(&mut self, name: &str) {
        self.durations.remove(name);
        self.ints.remove(name);
        self.strings.remove(name);
        self.timestamps.remove(name);
    }
}
