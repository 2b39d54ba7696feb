// EngineLifecycleManager: owner of the process-wide haptic engine
//
// Single Responsibility: engine creation, stop/reset handling, and
// serialized access to the engine for playback submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::config::EngineConfig;
use crate::engine::backend::{HapticBackend, HapticEngine, PatternPlayer};
use crate::engine::notification::{EngineNotification, EngineNotifier, StopReason};
use crate::error::{log_haptic_error, ErrorCode, HapticError};
use crate::pattern::HapticTimeline;

/// Tracked state of the engine handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No engine handle (never created, or creation failed)
    Uninitialized,
    /// Engine exists and was last known to be usable
    Created,
    /// Platform stopped the engine; the next playback restarts it
    Stopped,
}

/// Lifecycle transition published to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Created,
    CreateFailed { reason: String },
    Stopped { reason: StopReason },
    Restarted,
    RestartFailed { reason: String },
}

struct EngineSlot {
    state: EngineState,
    engine: Option<Box<dyn HapticEngine>>,
    restart_failures: u64,
}

/// Manages the haptic engine lifecycle
///
/// The engine handle and every operation on it sit behind one mutex.
/// Playback submission and stop/reset notifications both take that lock,
/// so a reset can never interleave with a half-finished submission.
///
/// Notifications arrive through an inbox. Hosts with a background thread call
/// [`spawn_notification_worker`](Self::spawn_notification_worker); single
/// threaded hosts and tests drain it with
/// [`process_pending`](Self::process_pending).
pub struct EngineLifecycleManager {
    backend: Arc<dyn HapticBackend>,
    config: EngineConfig,
    slot: Mutex<EngineSlot>,
    inbox_tx: mpsc::UnboundedSender<EngineNotification>,
    inbox_rx: Mutex<Option<mpsc::UnboundedReceiver<EngineNotification>>>,
    events_tx: broadcast::Sender<LifecycleEvent>,
    worker_started: AtomicBool,
}

impl EngineLifecycleManager {
    /// Create a manager with no engine yet
    pub fn new(backend: Arc<dyn HapticBackend>, config: EngineConfig) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (events_tx, _) = broadcast::channel(32);

        Self {
            backend,
            config,
            slot: Mutex::new(EngineSlot {
                state: EngineState::Uninitialized,
                engine: None,
                restart_failures: 0,
            }),
            inbox_tx,
            inbox_rx: Mutex::new(Some(inbox_rx)),
            events_tx,
            worker_started: AtomicBool::new(false),
        }
    }

    /// Construct the engine through the backend
    ///
    /// On failure the handle stays unset and playback falls back to simple
    /// vibration. The error is logged and returned for callers that care.
    pub fn create_engine(&self) -> Result<(), HapticError> {
        let mut slot = self.lock_slot()?;

        match self.backend.create_engine(self.notifier()) {
            Ok(engine) => {
                slot.engine = Some(engine);
                slot.state = EngineState::Created;
                info!("[Engine] Haptic engine created");
                self.publish(LifecycleEvent::Created);
                Ok(())
            }
            Err(err) => {
                slot.engine = None;
                slot.state = EngineState::Uninitialized;
                log_haptic_error(&err, "create_engine");
                self.publish(LifecycleEvent::CreateFailed {
                    reason: err.message(),
                });
                Err(err)
            }
        }
    }

    /// Sending half of the inbox, for backends
    pub fn notifier(&self) -> EngineNotifier {
        EngineNotifier::new(self.inbox_tx.clone())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events_tx.subscribe()
    }

    pub fn state(&self) -> EngineState {
        self.lock_slot()
            .map(|slot| slot.state)
            .unwrap_or(EngineState::Uninitialized)
    }

    /// Whether an engine handle exists
    pub fn is_available(&self) -> bool {
        self.lock_slot()
            .map(|slot| slot.engine.is_some())
            .unwrap_or(false)
    }

    /// Number of reset-triggered restarts that failed
    pub fn restart_failures(&self) -> u64 {
        self.lock_slot()
            .map(|slot| slot.restart_failures)
            .unwrap_or(0)
    }

    /// Submit a timeline and start it at time 0
    ///
    /// Order matches the platform contract: build the player, start the
    /// engine, start the player. Returns `Ok(None)` when no engine handle
    /// exists so the caller can take the fallback path.
    pub fn submit(
        &self,
        timeline: &HapticTimeline,
    ) -> Result<Option<Box<dyn PatternPlayer>>, HapticError> {
        let mut slot = self.lock_slot()?;
        let previous_state = slot.state;

        let Some(engine) = slot.engine.as_mut() else {
            debug!("[Engine] No engine handle, submission skipped");
            return Ok(None);
        };

        let mut player = engine.make_player(timeline)?;
        engine.start()?;
        if let Err(err) = player.start(0.0) {
            player.cancel();
            return Err(err);
        }

        if previous_state == EngineState::Stopped {
            info!("[Engine] Engine restarted by playback");
        }
        slot.state = EngineState::Created;

        Ok(Some(player))
    }

    /// Apply one notification under the engine lock
    pub fn handle_notification(&self, notification: EngineNotification) {
        let mut slot = match self.lock_slot() {
            Ok(slot) => slot,
            Err(_) => return,
        };

        match notification {
            EngineNotification::Stopped(reason) => {
                info!(
                    "[Engine] The engine stopped for reason: {}",
                    reason.describe()
                );
                if slot.engine.is_some() {
                    slot.state = EngineState::Stopped;
                }
                self.publish(LifecycleEvent::Stopped { reason });
            }
            EngineNotification::Reset => {
                if !self.config.auto_restart {
                    info!("[Engine] The engine reset; auto restart disabled");
                    return;
                }

                let Some(engine) = slot.engine.as_mut() else {
                    warn!("[Engine] The engine reset but no handle exists");
                    return;
                };

                info!("[Engine] The engine reset --> Restarting now!");
                match engine.start() {
                    Ok(()) => {
                        slot.state = EngineState::Created;
                        self.publish(LifecycleEvent::Restarted);
                    }
                    Err(err) => {
                        slot.restart_failures += 1;
                        error!("[Engine] Failed to restart the engine: {}", err);
                        self.publish(LifecycleEvent::RestartFailed {
                            reason: err.message(),
                        });
                    }
                }
            }
        }
    }

    /// Drain and apply every queued notification
    ///
    /// Returns the number handled. Always 0 once the background worker owns
    /// the inbox.
    pub fn process_pending(&self) -> usize {
        let pending: Vec<EngineNotification> = {
            let mut guard = match self.inbox_rx.lock() {
                Ok(guard) => guard,
                Err(_) => return 0,
            };
            let Some(rx) = guard.as_mut() else {
                return 0;
            };
            std::iter::from_fn(|| rx.try_recv().ok()).collect()
        };

        for notification in &pending {
            self.handle_notification(*notification);
        }
        pending.len()
    }

    /// Spawn the background thread that drains the inbox
    ///
    /// Idempotent. The worker holds only a weak reference, so it exits once
    /// the manager is dropped.
    pub fn spawn_notification_worker(self: &Arc<Self>) {
        if self
            .worker_started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let Some(mut rx) = self.inbox_rx.lock().ok().and_then(|mut guard| guard.take()) else {
            warn!("[Engine] Notification inbox unavailable, worker not started");
            return;
        };
        let manager: Weak<Self> = Arc::downgrade(self);

        // The FFI caller may not own a Tokio runtime, so the worker brings its own
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    error!("[Engine] Failed to create runtime for notification worker: {}", err);
                    return;
                }
            };

            rt.block_on(async move {
                while let Some(notification) = rx.recv().await {
                    match manager.upgrade() {
                        Some(manager) => manager.handle_notification(notification),
                        None => break,
                    }
                }
                debug!("[Engine] Notification worker exiting");
            });
        });
    }

    fn publish(&self, event: LifecycleEvent) {
        // no subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn lock_slot(&self) -> Result<MutexGuard<'_, EngineSlot>, HapticError> {
        self.slot.lock().map_err(|_| {
            let err = HapticError::LockPoisoned {
                component: "haptic_engine".to_string(),
            };
            log_haptic_error(&err, "lock_slot");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::DesktopStubBackend;
    use crate::pattern;
    use std::time::{Duration, Instant};

    fn manager_with(stub: &DesktopStubBackend) -> EngineLifecycleManager {
        EngineLifecycleManager::new(Arc::new(stub.clone()), EngineConfig::default())
    }

    #[test]
    fn test_new_manager_is_uninitialized() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        assert_eq!(manager.state(), EngineState::Uninitialized);
        assert!(!manager.is_available());
    }

    #[test]
    fn test_create_engine_success() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        let mut events = manager.subscribe();

        manager.create_engine().unwrap();

        assert_eq!(manager.state(), EngineState::Created);
        assert!(manager.is_available());
        assert_eq!(stub.record().engines_created, 1);
        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Created);
    }

    #[test]
    fn test_create_engine_failure_leaves_handle_unset() {
        let stub = DesktopStubBackend::new();
        stub.set_fail_create(true);
        let manager = manager_with(&stub);

        assert!(matches!(
            manager.create_engine(),
            Err(HapticError::EngineCreateFailed { .. })
        ));
        assert_eq!(manager.state(), EngineState::Uninitialized);

        let timeline = pattern::single_segment(100, 255);
        assert!(manager.submit(&timeline).unwrap().is_none());
        assert!(stub.record().timelines.is_empty());
    }

    #[test]
    fn test_submit_orders_calls_and_starts_at_zero() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        manager.create_engine().unwrap();

        let timeline = pattern::compile(&[0, 200, 100, 300], &[]).unwrap();
        let player = manager.submit(&timeline).unwrap();

        assert!(player.is_some());
        let record = stub.record();
        assert_eq!(record.timelines, vec![timeline]);
        assert_eq!(record.engine_starts, 1);
        assert_eq!(record.player_starts, vec![0.0]);
    }

    #[test]
    fn test_submit_player_start_failure_releases_player() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        manager.create_engine().unwrap();
        stub.set_fail_player_start(true);

        let result = manager.submit(&pattern::single_segment(100, 255));

        assert!(matches!(result, Err(HapticError::PlayerStartFailed { .. })));
        assert_eq!(stub.record().player_cancels, 1);
    }

    #[test]
    fn test_stop_then_reset_restarts_engine() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        manager.create_engine().unwrap();
        let mut events = manager.subscribe();

        manager.handle_notification(EngineNotification::Stopped(StopReason::IdleTimeout));
        assert_eq!(manager.state(), EngineState::Stopped);

        manager.handle_notification(EngineNotification::Reset);
        assert_eq!(manager.state(), EngineState::Created);
        assert_eq!(stub.record().engine_starts, 1);

        assert_eq!(
            events.try_recv().unwrap(),
            LifecycleEvent::Stopped {
                reason: StopReason::IdleTimeout
            }
        );
        assert_eq!(events.try_recv().unwrap(), LifecycleEvent::Restarted);
    }

    #[test]
    fn test_failed_restart_is_logged_and_counted() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        manager.create_engine().unwrap();
        manager.handle_notification(EngineNotification::Stopped(StopReason::SystemError));
        stub.set_fail_start(true);

        manager.handle_notification(EngineNotification::Reset);

        assert_eq!(manager.restart_failures(), 1);
        assert_eq!(manager.state(), EngineState::Stopped);
        assert!(manager.is_available());
    }

    #[test]
    fn test_reset_without_auto_restart_does_nothing() {
        let stub = DesktopStubBackend::new();
        let manager = EngineLifecycleManager::new(
            Arc::new(stub.clone()),
            EngineConfig {
                auto_restart: false,
            },
        );
        manager.create_engine().unwrap();

        manager.handle_notification(EngineNotification::Reset);

        assert_eq!(stub.record().engine_starts, 0);
    }

    #[test]
    fn test_process_pending_drains_backend_notifications() {
        let stub = DesktopStubBackend::new();
        let manager = manager_with(&stub);
        manager.create_engine().unwrap();

        let notifier = stub.notifier().unwrap();
        notifier.stopped(StopReason::ApplicationSuspended);
        notifier.reset();

        assert_eq!(manager.process_pending(), 2);
        assert_eq!(manager.state(), EngineState::Created);
        assert_eq!(manager.process_pending(), 0);
    }

    #[test]
    fn test_worker_applies_notifications() {
        let stub = DesktopStubBackend::new();
        let manager = Arc::new(manager_with(&stub));
        manager.create_engine().unwrap();
        manager.spawn_notification_worker();
        manager.spawn_notification_worker();

        stub.notifier()
            .unwrap()
            .stopped(StopReason::AudioSessionInterrupt);

        let deadline = Instant::now() + Duration::from_secs(2);
        while manager.state() != EngineState::Stopped && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(manager.state(), EngineState::Stopped);
        assert_eq!(manager.process_pending(), 0);
    }
}
