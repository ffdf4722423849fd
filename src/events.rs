//! Lock-guarded table of named events and their rules.
//!
//! The same component serves two roles: the registry's global event table
//! and each subscriber's subscription table. Every instance owns an
//! independent reader/writer lock, scoped to single map operations — the
//! lock is never held across I/O or across another table's lock.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::rules::Rules;

/// A concurrency-safe map of event name to rule bag.
///
/// Names are unique and case-sensitive; [`EventTable::find`] offers a
/// case-insensitive lookup on top of the case-sensitive store. An entry may
/// exist with no bag at all ("declared but otherwise empty"), which mostly
/// shows up in deserialized snapshots.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTable {
    map: RwLock<HashMap<String, Option<Rules>>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// All event names, lexicographically sorted. Map iteration order never
    /// reaches callers.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    pub fn exists(&self, name: &str) -> bool {
        self.map.read().contains_key(name)
    }

    /// Case-insensitive lookup returning the canonical stored name.
    ///
    /// Storage stays case-sensitive: two names differing only in case can
    /// coexist, and this returns whichever of them matches first. Exact
    /// lookups should use [`EventTable::exists`] or [`EventTable::get`].
    pub fn find(&self, name: &str) -> Option<String> {
        let wanted = name.to_lowercase();
        self.map
            .read()
            .keys()
            .find(|key| key.to_lowercase() == wanted)
            .cloned()
    }

    /// Declare a new event. Passing `None` attaches a fresh empty bag.
    ///
    /// Fails with [`RegistryError::EventExists`] if the name is taken,
    /// leaving the existing entry untouched.
    pub fn create(&self, name: impl Into<String>, rules: Option<Rules>) -> RegistryResult<()> {
        let name = name.into();
        let mut map = self.map.write();
        if map.contains_key(&name) {
            return Err(RegistryError::EventExists);
        }
        map.insert(name, Some(rules.unwrap_or_default()));
        Ok(())
    }

    /// A copy of the event's rule bag. A declared-but-empty event reads as
    /// an empty bag; `None` means the event does not exist.
    pub fn get(&self, name: &str) -> Option<Rules> {
        self.map
            .read()
            .get(name)
            .map(|rules| rules.clone().unwrap_or_default())
    }

    /// Delete an event. Returns whether anything was removed; unknown names
    /// are a silent no-op.
    pub fn remove(&self, name: &str) -> bool {
        self.map.write().remove(name).is_some()
    }

    /// Mute the event until `now + duration`. A zero duration unmutes.
    ///
    /// Fails with [`RegistryError::EventNotFound`] for unknown names.
    pub fn pause(&self, name: &str, duration: Duration) -> RegistryResult<()> {
        self.with_rules_mut(name, |rules| rules.pause_for(duration))
    }

    pub fn unpause(&self, name: &str) -> RegistryResult<()> {
        self.pause(name, Duration::ZERO)
    }

    /// Whether the event is currently muted.
    ///
    /// Unknown names report muted. That conservative default keeps
    /// undeclared or removed subscriptions out of delivery.
    pub fn is_paused(&self, name: &str) -> bool {
        match self.map.read().get(name) {
            Some(Some(rules)) => rules.is_paused(),
            Some(None) => false,
            None => true,
        }
    }

    /// Set a duration rule. Does nothing if the event does not exist.
    pub fn set_duration(&self, event: &str, rule: impl Into<String>, value: Duration) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.durations.insert(rule.into(), value);
        });
    }

    /// Set an integer rule. Does nothing if the event does not exist.
    pub fn set_int(&self, event: &str, rule: impl Into<String>, value: i64) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.ints.insert(rule.into(), value);
        });
    }

    /// Set a string rule. Does nothing if the event does not exist.
    pub fn set_string(&self, event: &str, rule: impl Into<String>, value: impl Into<String>) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.strings.insert(rule.into(), value.into());
        });
    }

    /// Set a timestamp rule. Does nothing if the event does not exist.
    pub fn set_timestamp(&self, event: &str, rule: impl Into<String>, value: DateTime<Utc>) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.timestamps.insert(rule.into(), value);
        });
    }

    /// A duration rule's value, or `None` if the event or rule is absent.
    pub fn duration(&self, event: &str, rule: &str) -> Option<Duration> {
        self.with_rules(event, |rules| rules.durations.get(rule).copied())
            .flatten()
    }

    /// An integer rule's value, or `None` if the event or rule is absent.
    pub fn int(&self, event: &str, rule: &str) -> Option<i64> {
        self.with_rules(event, |rules| rules.ints.get(rule).copied())
            .flatten()
    }

    /// A string rule's value, or `None` if the event or rule is absent.
    pub fn string(&self, event: &str, rule: &str) -> Option<String> {
        self.with_rules(event, |rules| rules.strings.get(rule).cloned())
            .flatten()
    }

    /// A timestamp rule's value, or `None` if the event or rule is absent.
    pub fn timestamp(&self, event: &str, rule: &str) -> Option<DateTime<Utc>> {
        self.with_rules(event, |rules| rules.timestamps.get(rule).copied())
            .flatten()
    }

    pub fn delete_duration(&self, event: &str, rule: &str) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.durations.remove(rule);
        });
    }

    pub fn delete_int(&self, event: &str, rule: &str) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.ints.remove(rule);
        });
    }

    pub fn delete_string(&self, event: &str, rule: &str) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.strings.remove(rule);
        });
    }

    pub fn delete_timestamp(&self, event: &str, rule: &str) {
        let _ = self.with_rules_mut(event, |rules| {
            rules.timestamps.remove(rule);
        });
    }

    /// Remove a rule name from every typed map of the event's bag, whatever
    /// type it was stored under. Unknown events and rules are a no-op.
    pub fn delete_rule(&self, event: &str, rule: &str) {
        let _ = self.with_rules_mut(event, |rules| rules.delete_rule(rule));
    }

    /// Run a closure against an event's rules under the read lock.
    /// A declared-but-empty event reads as an empty bag.
    pub(crate) fn with_rules<R>(&self, event: &str, f: impl FnOnce(&Rules) -> R) -> Option<R> {
        let map = self.map.read();
        match map.get(event)? {
            Some(rules) => Some(f(rules)),
            None => Some(f(&Rules::default())),
        }
    }

    /// Run a closure against an event's rules under the write lock,
    /// materializing the bag for declared-but-empty entries first.
    pub(crate) fn with_rules_mut<R>(
        &self,
        event: &str,
        f: impl FnOnce(&mut Rules) -> R,
    ) -> RegistryResult<R> {
        let mut map = self.map.write();
        let rules = map.get_mut(event).ok_or(RegistryError::EventNotFound)?;
        Ok(f(rules.get_or_insert_with(Rules::default)))
    }

    /// Replace this table's contents with another's.
    pub(crate) fn adopt(&self, other: EventTable) {
        *self.map.write() = other.map.into_inner();
    }
}
