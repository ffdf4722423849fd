//! An embeddable event and subscription registry.
//!
//! Tracks named events, subscribers (a contact address plus a delivery
//! channel), and each subscriber's per-event subscriptions, every one with
//! its own cooldown timer and typed rule metadata. When an event fires,
//! [`Registry::get_subscribers`] answers who is currently eligible to be
//! notified; actual delivery belongs to the calling application.
//!
//! The whole model snapshots to JSON and can be bound to a state file (see
//! [`Registry::load`]). All operations are synchronous and safe to call
//! from multiple threads.
//!
//! # Example
//!
//! ```
//! use subtrack::Registry;
//!
//! let registry = Registry::new();
//! registry.events.create("backup_done", None)?;
//!
//! let erin = registry.create_sub("erin@example.com", "email", false, false);
//! erin.subscribe("backup_done")?;
//!
//! let recipients = registry.get_subscribers("backup_done");
//! assert_eq!(recipients.len(), 1);
//! assert_eq!(recipients[0].contact, "erin@example.com");
//! # Ok::<(), subtrack::RegistryError>(())
//! ```

pub mod error;
pub mod events;
pub mod registry;
pub mod rules;
pub mod storage;
pub mod subscriber;

pub use error::{RegistryError, RegistryResult};
pub use events::EventTable;
pub use registry::Registry;
pub use rules::Rules;
pub use subscriber::Subscriber;
