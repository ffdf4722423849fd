//! End-to-End Integration Tests
//!
//! Exercises the full registry workflow: declare events, register
//! subscribers, manage subscriptions and cooldowns, and filter recipients
//! at event time.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use subtrack::Registry;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn full_notification_lifecycle() -> Result<()> {
    init_logging();
    let registry = Registry::new();

    // declare a couple of global events with rule metadata
    registry.events.create("disk_full", None)?;
    registry.events.set_int("disk_full", "threshold_pct", 90);
    registry.events.create("motion_detected", None)?;
    registry
        .events
        .set_duration("motion_detected", "min_interval", Duration::from_secs(30));

    // three subscribers on two channels
    let alice = registry.create_sub("alice", "sms-primary", true, false);
    alice.subscribe("disk_full")?;
    alice.subscribe("motion_detected")?;

    let bob = registry.create_sub("bob", "email", false, false);
    bob.subscribe("disk_full")?;

    let carol = registry.create_sub("carol", "sms-backup", false, true);
    carol.subscribe("disk_full")?;

    // everyone but the ignored subscriber hears about disk_full
    let recipients = registry.get_subscribers("disk_full");
    assert_eq!(recipients.len(), 2);
    assert_eq!(recipients[0].contact, "alice");
    assert_eq!(recipients[1].contact, "bob");

    // restrict to sms: prefix matching picks up both sms channels,
    // but carol stays ignored and bob's email is out
    registry.set_allowed_channels(vec!["sms".to_string()]);
    let recipients = registry.get_subscribers("disk_full");
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].contact, "alice");

    // "all" readmits every channel
    registry.set_allowed_channels(vec!["all".to_string()]);
    assert_eq!(registry.get_subscribers("disk_full").len(), 2);
    registry.set_allowed_channels(vec![]);

    // nobody subscribed to an unknown event
    assert!(registry.get_subscribers("cpu_hot").is_empty());

    // remove an event everywhere and count the dropped subscriptions
    assert_eq!(registry.event_remove("disk_full"), 3);
    assert!(registry.get_subscribers("disk_full").is_empty());
    assert_eq!(alice.subscriptions(), vec!["motion_detected"]);

    Ok(())
}

#[test]
fn pause_expires_after_its_duration() -> Result<()> {
    init_logging();
    let registry = Registry::new();

    let alice = registry.create_sub("alice", "sms", false, false);
    alice.subscribe("alert")?;
    assert_eq!(registry.get_subscribers("alert").len(), 1);

    alice.pause("alert", Duration::from_millis(100))?;
    assert!(
        registry.get_subscribers("alert").is_empty(),
        "a paused subscription must not receive notifications"
    );

    thread::sleep(Duration::from_millis(200));
    let recipients = registry.get_subscribers("alert");
    assert_eq!(recipients.len(), 1, "the pause must have expired");
    assert_eq!(recipients[0].contact, "alice");

    Ok(())
}

#[test]
fn subscription_rules_survive_the_round_trip() -> Result<()> {
    init_logging();
    let registry = Registry::new();

    let alice = registry.create_sub("alice", "sms", false, false);
    alice.subscribe("motion_detected")?;
    alice.replace_rules(
        "motion_detected",
        &["front_door".to_string(), "driveway".to_string()],
    )?;

    let parsed = Registry::from_json(&registry.to_json()?)?;
    let alice = parsed.get_subscriber("alice", "sms")?;
    assert_eq!(alice.rules("motion_detected"), vec!["driveway", "front_door"]);
    assert!(alice.rule_exists("motion_detected", "front_door"));

    Ok(())
}

#[test]
fn concurrent_subscribers_and_queries() {
    init_logging();
    let registry = std::sync::Arc::new(Registry::new());
    registry.events.create("load_high", None).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let registry = std::sync::Arc::clone(&registry);
            thread::spawn(move || {
                for i in 0..50 {
                    let contact = format!("user-{worker}-{i}");
                    let sub = registry.create_sub(&contact, "pushover", false, false);
                    sub.subscribe("load_high").unwrap();
                    if i % 2 == 0 {
                        sub.pause("load_high", Duration::from_secs(300)).unwrap();
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let registry = std::sync::Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..100 {
                    // the result set changes under us; it must simply never panic
                    let _ = registry.get_subscribers("load_high");
                    let _ = registry.events.names();
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    assert_eq!(registry.get_all_subscribers().len(), 200);
    // half of each worker's subscriptions are paused
    assert_eq!(registry.get_subscribers("load_high").len(), 100);
}
