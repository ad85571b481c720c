//! The command store: one [`DoorIntent`] record plus its auto-revert timer.

use chrono::Utc;
use doorbot_core::types::{DoorIntent, IntentSnapshot};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::activity::{ActivityEntry, ActivityLog, DEFAULT_CAPACITY};

#[derive(Debug)]
struct StoreInner {
    intent: DoorIntent,
    last_unlock_user: Option<String>,
    /// Sound named by the most recent accepted command; empty for none.
    sound: String,
    /// Sounds the device has registered.
    sounds: Vec<String>,
    /// Pending auto-revert task, if an unlock is live.
    revert: Option<JoinHandle<()>>,
    /// Bumped on every mutation; a revert task only fires if its captured
    /// generation still matches, so a superseded timer is a no-op even if
    /// it has already woken up.
    generation: u64,
    activity: ActivityLog,
}

/// Owned, injectable store for the current door intent.
///
/// All reads and writes of the intent, the timer handle, and the activity
/// log happen under a single async mutex. Clones share the same store.
#[derive(Debug, Clone)]
pub struct IntentStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl IntentStore {
    pub fn new() -> Self {
        Self::with_activity_capacity(DEFAULT_CAPACITY)
    }

    /// Create a store retaining at most `capacity` activity entries.
    pub fn with_activity_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                intent: DoorIntent::locked(),
                last_unlock_user: None,
                sound: String::new(),
                sounds: Vec::new(),
                revert: None,
                generation: 0,
                activity: ActivityLog::new(capacity),
            })),
        }
    }

    /// Current intent snapshot. Side-effect-free.
    pub async fn snapshot(&self) -> DoorIntent {
        self.inner.lock().await.intent.clone()
    }

    /// Render the intent in the wire format served to pollers.
    pub async fn render(&self) -> IntentSnapshot {
        let inner = self.inner.lock().await;
        IntentSnapshot {
            letmein: inner.intent.unlock,
            last_command_time: inner.intent.issued_at.map(|t| t.to_rfc3339()),
            last_unlock_user: inner.last_unlock_user.clone(),
            sound: inner.sound.clone(),
            sounds: inner.sounds.clone(),
        }
    }

    /// Sounds the device has registered.
    pub async fn sounds(&self) -> Vec<String> {
        self.inner.lock().await.sounds.clone()
    }

    /// Replace the registered sound list. Returns the new count.
    pub async fn set_sounds(&self, sounds: Vec<String>) -> usize {
        let mut inner = self.inner.lock().await;
        info!(count = sounds.len(), "sound list updated");
        inner.sounds = sounds;
        inner.sounds.len()
    }

    /// Recent accepted commands, oldest first.
    pub async fn recent_activity(&self) -> Vec<ActivityEntry> {
        self.inner.lock().await.activity.entries().cloned().collect()
    }

    /// Set the stored intent.
    ///
    /// An unlock with `revert_after` schedules the auto-revert timer,
    /// canceling any pending one first; a lock cancels any pending timer.
    /// The requested sound is overwritten on every accepted command, so a
    /// command naming none clears it. Returns the resulting intent.
    pub async fn set_intent(
        &self,
        unlock: bool,
        revert_after: Option<Duration>,
        user: Option<&str>,
        sound: Option<&str>,
    ) -> DoorIntent {
        let mut inner = self.inner.lock().await;

        inner.generation += 1;
        let generation = inner.generation;

        if let Some(pending) = inner.revert.take() {
            pending.abort();
            debug!("canceled pending auto-revert");
        }

        inner.intent.unlock = unlock;
        inner.intent.issued_at = Some(Utc::now());
        if unlock {
            inner.last_unlock_user = user.map(str::to_string);
        }
        inner.sound = sound.unwrap_or_default().to_string();
        inner.activity.record(unlock, user.map(str::to_string));

        info!(
            unlock,
            user = user.unwrap_or("anonymous"),
            "intent updated"
        );

        if unlock {
            if let Some(delay) = revert_after {
                inner.revert = Some(self.spawn_revert(delay, generation));
            }
        }

        inner.intent.clone()
    }

    fn spawn_revert(&self, delay: Duration, generation: u64) -> JoinHandle<()> {
        let store = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = store.lock().await;
            if inner.generation != generation {
                // A newer command superseded this timer while it was
                // waiting for the lock.
                return;
            }
            inner.generation += 1;
            inner.revert = None;
            inner.intent.unlock = false;
            info!(delay_ms = delay.as_millis() as u64, "auto-revert: intent back to locked");
        })
    }
}

impl Default for IntentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_write_wins() {
        let store = IntentStore::new();
        store.set_intent(true, None, Some("alice"), None).await;
        store.set_intent(false, None, None, None).await;
        store.set_intent(true, None, Some("bob"), None).await;

        let intent = store.snapshot().await;
        assert!(intent.unlock);
        assert!(intent.issued_at.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_setters_no_lost_update() {
        let store = IntentStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.set_intent(i % 2 == 0, None, None, None).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // The final call decides the state regardless of interleaving.
        store.set_intent(false, None, None, None).await;
        assert!(!store.snapshot().await.unlock);
        assert_eq!(store.recent_activity().await.len(), 33);
    }

    #[tokio::test]
    async fn test_auto_revert_flips_back() {
        let store = IntentStore::new();
        store
            .set_intent(true, Some(Duration::from_millis(100)), Some("alice"), None)
            .await;
        assert!(store.snapshot().await.unlock);

        tokio::time::sleep(Duration::from_millis(250)).await;
        let intent = store.snapshot().await;
        assert!(!intent.unlock);
        // issued_at reflects the command, not the revert.
        assert!(intent.issued_at.is_some());
    }

    #[tokio::test]
    async fn test_repeat_unlock_replaces_timer() {
        let store = IntentStore::new();
        store
            .set_intent(true, Some(Duration::from_millis(200)), None, None)
            .await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        store
            .set_intent(true, Some(Duration::from_millis(200)), None, None)
            .await;

        // Past the first timer's deadline but inside the second's window:
        // the first must have been canceled.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(store.snapshot().await.unlock);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(!store.snapshot().await.unlock);
    }

    #[tokio::test]
    async fn test_lock_cancels_pending_revert() {
        let store = IntentStore::new();
        store
            .set_intent(true, Some(Duration::from_millis(100)), None, None)
            .await;
        store.set_intent(false, None, None, None).await;

        tokio::time::sleep(Duration::from_millis(200)).await;
        let intent = store.snapshot().await;
        assert!(!intent.unlock);
    }

    #[tokio::test]
    async fn test_unlock_after_revert_sticks() {
        let store = IntentStore::new();
        store
            .set_intent(true, Some(Duration::from_millis(50)), None, None)
            .await;
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!store.snapshot().await.unlock);

        // A fresh unlock is not affected by the already-fired timer.
        store
            .set_intent(true, Some(Duration::from_millis(300)), None, None)
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(store.snapshot().await.unlock);
    }

    #[tokio::test]
    async fn test_render_wire_shape() {
        let store = IntentStore::new();
        let rendered = store.render().await;
        assert!(!rendered.letmein);
        assert!(rendered.last_command_time.is_none());
        assert!(rendered.last_unlock_user.is_none());

        store.set_intent(true, None, Some("alice"), None).await;
        let rendered = store.render().await;
        assert!(rendered.letmein);
        assert!(rendered.last_command_time.is_some());
        assert_eq!(rendered.last_unlock_user.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_sounds_render_alongside_intent() {
        let store = IntentStore::new();
        assert!(store.render().await.sounds.is_empty());

        let count = store
            .set_sounds(vec!["doorbell".to_string(), "chime".to_string()])
            .await;
        assert_eq!(count, 2);

        store.set_intent(true, None, None, Some("chime")).await;
        let rendered = store.render().await;
        assert_eq!(rendered.sound, "chime");
        assert_eq!(rendered.sounds.len(), 2);

        // The sound list survives intent changes.
        store.set_intent(false, None, None, None).await;
        let rendered = store.render().await;
        assert_eq!(rendered.sound, "");
        assert_eq!(rendered.sounds.len(), 2);
    }
}
