//! # Feature: Command Cooldowns
//!
//! Enforces a fixed minimum interval between successive uses of the same
//! command by the same user. Uses DashMap entry guards so the check-then-set
//! on a key stays atomic across concurrent interactions.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with per-(user, command) expiry tracking

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum interval between uses of one command by one user.
pub const COMMAND_COOLDOWN: Duration = Duration::from_millis(5000);

/// Outcome of a cooldown check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownGate {
    Allowed,
    Denied { remaining: Duration },
}

#[derive(Clone)]
pub struct CooldownStore {
    entries: Arc<DashMap<(u64, String), Instant>>,
    interval: Duration,
}

impl CooldownStore {
    pub fn new(interval: Duration) -> Self {
        CooldownStore {
            entries: Arc::new(DashMap::new()),
            interval,
        }
    }

    /// Checks and arms the cooldown for (user, command).
    ///
    /// An Allowed result writes the new expiry before returning, so a second
    /// caller racing on the same key is Denied. Expired entries are renewed
    /// in place and also swept by a deletion task scheduled at arm time.
    pub fn try_acquire(&self, user_id: u64, command: &str) -> CooldownGate {
        let gate = self.try_acquire_at(user_id, command, Instant::now());
        if gate == CooldownGate::Allowed {
            self.schedule_removal(user_id, command.to_owned());
        }
        gate
    }

    fn try_acquire_at(&self, user_id: u64, command: &str, now: Instant) -> CooldownGate {
        // The entry guard is held across the whole check-then-set; no await
        // point may ever be inserted here.
        match self.entries.entry((user_id, command.to_owned())) {
            Entry::Occupied(mut slot) => {
                let expires_at = *slot.get();
                if now < expires_at {
                    CooldownGate::Denied {
                        remaining: expires_at - now,
                    }
                } else {
                    slot.insert(now + self.interval);
                    CooldownGate::Allowed
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(now + self.interval);
                CooldownGate::Allowed
            }
        }
    }

    fn schedule_removal(&self, user_id: u64, command: String) {
        let entries = Arc::clone(&self.entries);
        let delay = self.interval;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // A renewed entry has a later expiry and must survive the sweep.
            entries.remove_if(&(user_id, command), |_, expires_at| {
                Instant::now() >= *expires_at
            });
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CooldownStore {
    fn default() -> Self {
        CooldownStore::new(COMMAND_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_use_is_allowed() {
        let store = CooldownStore::default();
        let now = Instant::now();

        assert_eq!(store.try_acquire_at(1, "ping", now), CooldownGate::Allowed);
    }

    #[test]
    fn test_second_use_within_window_is_denied() {
        let store = CooldownStore::default();
        let start = Instant::now();

        assert_eq!(store.try_acquire_at(1, "ping", start), CooldownGate::Allowed);
        match store.try_acquire_at(1, "ping", start + Duration::from_millis(1000)) {
            CooldownGate::Denied { remaining } => {
                assert_eq!(remaining, Duration::from_millis(4000));
            }
            CooldownGate::Allowed => panic!("expected denial inside the window"),
        }
    }

    #[test]
    fn test_remaining_is_bounded_and_decreasing() {
        let store = CooldownStore::default();
        let start = Instant::now();

        assert_eq!(store.try_acquire_at(7, "embed", start), CooldownGate::Allowed);

        let mut previous = COMMAND_COOLDOWN;
        for offset_ms in [500u64, 2500, 4900] {
            match store.try_acquire_at(7, "embed", start + Duration::from_millis(offset_ms)) {
                CooldownGate::Denied { remaining } => {
                    assert!(remaining <= COMMAND_COOLDOWN);
                    assert!(remaining < previous);
                    previous = remaining;
                }
                CooldownGate::Allowed => panic!("expected denial at +{}ms", offset_ms),
            }
        }
    }

    #[test]
    fn test_allowed_again_after_window() {
        let store = CooldownStore::default();
        let start = Instant::now();

        assert_eq!(store.try_acquire_at(1, "verify", start), CooldownGate::Allowed);
        assert_eq!(
            store.try_acquire_at(1, "verify", start + COMMAND_COOLDOWN),
            CooldownGate::Allowed
        );

        // The renewal arms a fresh window.
        match store.try_acquire_at(1, "verify", start + Duration::from_millis(7500)) {
            CooldownGate::Denied { remaining } => {
                assert_eq!(remaining, Duration::from_millis(2500));
            }
            CooldownGate::Allowed => panic!("renewal should have re-armed the cooldown"),
        }
    }

    #[test]
    fn test_keys_isolate_users_and_commands() {
        let store = CooldownStore::default();
        let now = Instant::now();

        assert_eq!(store.try_acquire_at(1, "ping", now), CooldownGate::Allowed);
        assert_eq!(store.try_acquire_at(2, "ping", now), CooldownGate::Allowed);
        assert_eq!(store.try_acquire_at(1, "embed", now), CooldownGate::Allowed);
        assert!(matches!(
            store.try_acquire_at(1, "ping", now + Duration::from_millis(1)),
            CooldownGate::Denied { .. }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_same_key_yields_one_allowed() {
        let store = CooldownStore::default();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.try_acquire(99, "verify") }));
        }

        let mut allowed = 0;
        for handle in handles {
            if handle.await.unwrap() == CooldownGate::Allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_swept() {
        let store = CooldownStore::new(Duration::from_millis(100));

        assert_eq!(store.try_acquire(1, "ping"), CooldownGate::Allowed);
        assert_eq!(store.len(), 1);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(store.is_empty());
    }
}
