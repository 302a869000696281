//! The device subscription registry.
//!
//! One [`DeviceSubscription`] per clientId. Connect and disconnect for
//! the same clientId race across broker threads, so every counter
//! mutation is a read-modify-write under the map's per-key shard lock;
//! a disconnect from a superseded connection must never clear state for
//! a newer, still-active connection.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

/// Per-client session state, exclusively owned by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSubscription {
    /// The vehicle the device is bound to. `None` only in degraded mode
    /// (profile check disabled).
    pub vehicle_id: Option<String>,
    /// Topics the client currently holds subscriptions on.
    pub subscribed_topics: HashSet<String>,
    /// Flagged by operations when the device misbehaves.
    pub suspicious: bool,
    /// The resolved device hardware type, if known.
    pub device_type: Option<String>,
    /// Follows the alternate status-reporting path.
    pub ssdp_vehicle: bool,
    /// Number of live connections for this clientId. At least 1 while
    /// the entry is alive.
    pub connection_counter: u32,
}

/// Result of releasing one connection of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// The last connection went away; the entry was removed and is
    /// returned so the caller can decide whether an offline event fires.
    Removed(DeviceSubscription),
    /// Other connections remain; the counter after the decrement.
    Retained(u32),
    /// No entry for the clientId (duplicate or late disconnect).
    NotFound,
}

/// Concurrent map clientId → [`DeviceSubscription`].
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: DashMap<String, DeviceSubscription>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites the entry on connect. Always replaces
    /// vehicle_id and device_type; an existing entry keeps its counter
    /// and subscribed topics (the caller owns counter semantics via
    /// [`acquire`](Self::acquire)/[`release`](Self::release)).
    ///
    /// Returns the connection counter after the bind.
    pub fn bind(
        &self,
        client_id: &str,
        vehicle_id: Option<String>,
        device_type: Option<String>,
    ) -> u32 {
        let mut entry = self.entries.entry(client_id.to_string()).or_default();
        entry.vehicle_id = vehicle_id;
        entry.device_type = device_type;
        if entry.connection_counter == 0 {
            entry.connection_counter = 1;
        }
        entry.connection_counter
    }

    /// Increments the connection counter of an existing entry
    /// (duplicate/overlapping connect). Returns the new counter, or
    /// `None` when no entry exists.
    pub fn acquire(&self, client_id: &str) -> Option<u32> {
        self.entries.get_mut(client_id).map(|mut entry| {
            entry.connection_counter += 1;
            entry.connection_counter
        })
    }

    /// Decrements the connection counter; removes the entry when the
    /// counter would go non-positive.
    pub fn release(&self, client_id: &str) -> ReleaseOutcome {
        loop {
            {
                let Some(mut entry) = self.entries.get_mut(client_id) else {
                    return ReleaseOutcome::NotFound;
                };
                if entry.connection_counter > 1 {
                    entry.connection_counter -= 1;
                    return ReleaseOutcome::Retained(entry.connection_counter);
                }
            }
            // Counter is at 1: the entry goes away. The predicate
            // re-checks under the shard lock; a concurrent connect may
            // have raised the counter, in which case we retry the
            // decrement instead of dropping a live session.
            if let Some((_, removed)) = self
                .entries
                .remove_if(client_id, |_, entry| entry.connection_counter <= 1)
            {
                debug!(client_id, "Last connection released, subscription removed");
                return ReleaseOutcome::Removed(removed);
            }
        }
    }

    /// Records a topic subscription. Returns `false` when the client is
    /// unknown.
    pub fn add_topic(&self, client_id: &str, topic: &str) -> bool {
        match self.entries.get_mut(client_id) {
            Some(mut entry) => {
                entry.subscribed_topics.insert(topic.to_string());
                true
            }
            None => false,
        }
    }

    /// Drops a topic subscription. Returns `false` when the client is
    /// unknown.
    pub fn remove_topic(&self, client_id: &str, topic: &str) -> bool {
        match self.entries.get_mut(client_id) {
            Some(mut entry) => entry.subscribed_topics.remove(topic),
            None => false,
        }
    }

    /// Forced invalidation (ECU swap, suspicious device). Returns the
    /// removed entry regardless of its counter.
    pub fn remove(&self, client_id: &str) -> Option<DeviceSubscription> {
        self.entries.remove(client_id).map(|(_, entry)| entry)
    }

    /// Snapshot of the entry.
    pub fn get(&self, client_id: &str) -> Option<DeviceSubscription> {
        self.entries.get(client_id).map(|entry| entry.value().clone())
    }

    /// The resolved device type, if any.
    pub fn device_type(&self, client_id: &str) -> Option<String> {
        self.entries
            .get(client_id)
            .and_then(|entry| entry.device_type.clone())
    }

    /// Flags the device as suspicious. Returns `false` when unknown.
    pub fn mark_suspicious(&self, client_id: &str) -> bool {
        match self.entries.get_mut(client_id) {
            Some(mut entry) => {
                entry.suspicious = true;
                true
            }
            None => false,
        }
    }

    /// Marks the subscription as following the alternate status path.
    pub fn set_ssdp_vehicle(&self, client_id: &str, ssdp: bool) -> bool {
        match self.entries.get_mut(client_id) {
            Some(mut entry) => {
                entry.ssdp_vehicle = ssdp;
                true
            }
            None => false,
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_bind_creates_with_counter_one() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(registry.bind("cl1", Some("vin1".to_string()), None), 1);
        assert_eq!(registry.get("cl1").unwrap().vehicle_id.as_deref(), Some("vin1"));
    }

    #[test]
    fn test_duplicate_connects_raise_counter_to_two() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", Some("vin1".to_string()), None);
        assert_eq!(registry.acquire("cl1"), Some(2));
    }

    #[test]
    fn test_matching_disconnects_remove_entry_at_zero() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", Some("vin1".to_string()), None);
        registry.acquire("cl1");

        assert_eq!(registry.release("cl1"), ReleaseOutcome::Retained(1));
        match registry.release("cl1") {
            ReleaseOutcome::Removed(sub) => {
                assert_eq!(sub.vehicle_id.as_deref(), Some("vin1"));
            }
            other => panic!("expected removal, got {other:?}"),
        }
        assert!(registry.get("cl1").is_none());
    }

    #[test]
    fn test_partial_disconnect_from_two_leaves_entry_intact() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", Some("vin1".to_string()), None);
        registry.acquire("cl1");

        assert_eq!(registry.release("cl1"), ReleaseOutcome::Retained(1));
        let entry = registry.get("cl1").unwrap();
        assert_eq!(entry.connection_counter, 1);
    }

    #[test]
    fn test_release_unknown_client_is_not_found() {
        let registry = SubscriptionRegistry::new();
        assert_eq!(registry.release("ghost"), ReleaseOutcome::NotFound);
    }

    #[test]
    fn test_bind_overwrites_vehicle_and_device_type_but_keeps_counter() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", Some("vin1".to_string()), Some("tcu".to_string()));
        registry.acquire("cl1");
        registry.add_topic("cl1", "t1");

        let counter = registry.bind("cl1", Some("vin2".to_string()), None);
        assert_eq!(counter, 2);
        let entry = registry.get("cl1").unwrap();
        assert_eq!(entry.vehicle_id.as_deref(), Some("vin2"));
        assert_eq!(entry.device_type, None);
        assert!(entry.subscribed_topics.contains("t1"));
    }

    #[test]
    fn test_topic_bookkeeping() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", None, None);
        assert!(registry.add_topic("cl1", "alerts"));
        assert!(registry.get("cl1").unwrap().subscribed_topics.contains("alerts"));
        assert!(registry.remove_topic("cl1", "alerts"));
        assert!(!registry.remove_topic("cl1", "alerts"));
        assert!(!registry.add_topic("ghost", "alerts"));
    }

    #[test]
    fn test_forced_remove_ignores_counter() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", None, None);
        registry.acquire("cl1");
        let removed = registry.remove("cl1").unwrap();
        assert_eq!(removed.connection_counter, 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_status_flags() {
        let registry = SubscriptionRegistry::new();
        registry.bind("cl1", Some("vin1".to_string()), None);

        assert!(registry.mark_suspicious("cl1"));
        assert!(registry.set_ssdp_vehicle("cl1", true));
        let entry = registry.get("cl1").unwrap();
        assert!(entry.suspicious);
        assert!(entry.ssdp_vehicle);

        assert!(!registry.mark_suspicious("ghost"));
        assert!(!registry.set_ssdp_vehicle("ghost", true));
    }

    #[test]
    fn test_concurrent_connects_and_disconnects_balance_out() {
        use std::sync::Arc;

        let registry = Arc::new(SubscriptionRegistry::new());
        registry.bind("cl1", Some("vin1".to_string()), None);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    reg.acquire("cl1");
                    reg.release("cl1");
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let entry = registry.get("cl1").unwrap();
        assert_eq!(entry.connection_counter, 1);
    }
}
