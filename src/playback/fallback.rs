//! Fallback vibration loop for hosts without a usable haptic engine.
//!
//! Fires one pulse immediately, then one pulse per tick until the requested
//! duration has elapsed. The loop checks a cancel flag at every tick, and the
//! flag is set under the same lock the tick holds while firing, so no pulse
//! fires once [`FallbackTimer::cancel`] has returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, error};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::engine::backend::{SystemVibrator, TimeSource};

/// Stop predicate: true once more than `duration` has elapsed since `start`
#[derive(Debug, Clone, Copy)]
pub struct FallbackDeadline {
    start: Instant,
    duration: Duration,
}

impl FallbackDeadline {
    pub fn new(start: Instant, duration: Duration) -> Self {
        Self { start, duration }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.start) > self.duration
    }
}

struct FallbackShared {
    // guards pulse firing as well as the flag itself
    cancelled: Mutex<bool>,
    finished: AtomicBool,
}

impl FallbackShared {
    fn lock_cancelled(&self) -> MutexGuard<'_, bool> {
        // a panicking vibrator must not wedge cancellation
        self.cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle to a running fallback loop. Dropping it cancels the loop.
pub struct FallbackTimer {
    shared: Arc<FallbackShared>,
    cancel_tx: watch::Sender<bool>,
}

impl FallbackTimer {
    /// Fire the first pulse and schedule the rest.
    ///
    /// Runs on the ambient Tokio runtime when there is one, otherwise on a
    /// dedicated thread with its own current-thread runtime.
    pub fn start(
        duration: Duration,
        tick: Duration,
        vibrator: Arc<dyn SystemVibrator>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        let shared = Arc::new(FallbackShared {
            cancelled: Mutex::new(false),
            finished: AtomicBool::new(false),
        });
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let deadline = FallbackDeadline::new(time_source.now(), duration);

        vibrator.play_default_pulse();

        let task = run_loop(
            Arc::clone(&shared),
            cancel_rx,
            tick.max(Duration::from_millis(1)),
            deadline,
            vibrator,
            time_source,
        );

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
            }
            Err(_) => {
                let shared = Arc::clone(&shared);
                std::thread::spawn(move || {
                    match tokio::runtime::Builder::new_current_thread()
                        .enable_time()
                        .build()
                    {
                        Ok(rt) => rt.block_on(task),
                        Err(err) => {
                            error!("[Playback] Failed to create runtime for fallback timer: {}", err);
                            shared.finished.store(true, Ordering::SeqCst);
                        }
                    }
                });
            }
        }

        debug!(
            "[Playback] Fallback timer started: duration={:?}, tick={:?}",
            duration, tick
        );

        Self { shared, cancel_tx }
    }

    /// Stop the loop. Idempotent.
    pub fn cancel(&self) {
        *self.shared.lock_cancelled() = true;
        let _ = self.cancel_tx.send(true);
    }

    /// True once the loop has exited (deadline reached or cancelled)
    pub fn is_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }
}

impl Drop for FallbackTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_loop(
    shared: Arc<FallbackShared>,
    mut cancel_rx: watch::Receiver<bool>,
    tick: Duration,
    deadline: FallbackDeadline,
    vibrator: Arc<dyn SystemVibrator>,
    time_source: Arc<dyn TimeSource>,
) {
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
    // a stalled worker resumes with one pulse, not a catch-up burst
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel_rx.changed() => break,
        }

        let cancelled = shared.lock_cancelled();
        if *cancelled || deadline.expired(time_source.now()) {
            break;
        }
        vibrator.play_default_pulse();
    }

    shared.finished.store(true, Ordering::SeqCst);
    debug!("[Playback] Fallback timer finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::{StubTimeSource, StubVibrator, SystemTimeSource};

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(3);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        done()
    }

    struct StallingVibrator {
        pulses: Mutex<Vec<Instant>>,
        stall_on: usize,
        stall: Duration,
    }

    impl SystemVibrator for StallingVibrator {
        fn play_default_pulse(&self) {
            let index = {
                let mut pulses = self.pulses.lock().unwrap();
                pulses.push(Instant::now());
                pulses.len() - 1
            };
            if index == self.stall_on {
                std::thread::sleep(self.stall);
            }
        }
    }

    #[test]
    fn test_stalled_loop_does_not_burst() {
        let vibrator = Arc::new(StallingVibrator {
            pulses: Mutex::new(Vec::new()),
            stall_on: 1,
            stall: Duration::from_millis(80),
        });
        let timer = FallbackTimer::start(
            Duration::from_millis(200),
            Duration::from_millis(10),
            vibrator.clone(),
            Arc::new(SystemTimeSource::default()),
        );

        assert!(wait_until(|| timer.is_finished()));
        let pulses = vibrator.pulses.lock().unwrap().clone();
        assert!(pulses.len() >= 4, "too few pulses: {}", pulses.len());

        // pulse 1 stalled; every later pulse keeps the tick spacing
        for pair in pulses[1..].windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(5), "burst gap {:?}", gap);
        }
    }

    #[test]
    fn test_deadline_is_strictly_greater_than() {
        let start = Instant::now();
        let deadline = FallbackDeadline::new(start, Duration::from_millis(100));
        assert!(!deadline.expired(start));
        assert!(!deadline.expired(start + Duration::from_millis(100)));
        assert!(deadline.expired(start + Duration::from_millis(101)));
    }

    #[test]
    fn test_stub_time_source_drives_deadline() {
        let time = StubTimeSource::with_step(Duration::from_millis(400));
        let deadline = FallbackDeadline::new(time.now(), Duration::from_millis(1000));
        let expired: Vec<bool> = (0..3).map(|_| deadline.expired(time.now())).collect();
        assert_eq!(expired, vec![false, false, true]);
    }

    #[test]
    fn test_fires_immediately_then_stops_after_duration() {
        let vibrator = StubVibrator::default();
        let timer = FallbackTimer::start(
            Duration::from_millis(35),
            Duration::from_millis(10),
            Arc::new(vibrator.clone()),
            Arc::new(SystemTimeSource::default()),
        );
        assert!(vibrator.pulses() >= 1);

        assert!(wait_until(|| timer.is_finished()));
        let pulses = vibrator.pulses();
        assert!((1..=5).contains(&pulses), "unexpected pulse count {pulses}");

        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(vibrator.pulses(), pulses);
    }

    #[test]
    fn test_cancel_stops_pulses_permanently() {
        let vibrator = StubVibrator::default();
        let timer = FallbackTimer::start(
            Duration::from_secs(60),
            Duration::from_millis(5),
            Arc::new(vibrator.clone()),
            Arc::new(SystemTimeSource::default()),
        );
        std::thread::sleep(Duration::from_millis(30));

        timer.cancel();
        let pulses = vibrator.pulses();
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(vibrator.pulses(), pulses);
        assert!(wait_until(|| timer.is_finished()));
        timer.cancel();
    }

    #[test]
    fn test_drop_cancels() {
        let vibrator = StubVibrator::default();
        let timer = FallbackTimer::start(
            Duration::from_secs(60),
            Duration::from_millis(5),
            Arc::new(vibrator.clone()),
            Arc::new(SystemTimeSource::default()),
        );
        drop(timer);
        let pulses = vibrator.pulses();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(vibrator.pulses(), pulses);
    }

    #[test]
    fn test_runs_on_ambient_runtime() {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let _guard = rt.enter();

        let vibrator = StubVibrator::default();
        let timer = FallbackTimer::start(
            Duration::from_millis(15),
            Duration::from_millis(5),
            Arc::new(vibrator.clone()),
            Arc::new(SystemTimeSource::default()),
        );

        assert!(wait_until(|| timer.is_finished()));
        assert!(vibrator.pulses() >= 1);
    }
}
