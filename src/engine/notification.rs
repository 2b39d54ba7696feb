//! Asynchronous engine notifications.
//!
//! The platform engine can be stopped or reset at any time. Backends report
//! those events through an [`EngineNotifier`]; the lifecycle manager drains
//! them from its inbox under the engine lock.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Why the platform stopped the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    AudioSessionInterrupt,
    ApplicationSuspended,
    IdleTimeout,
    SystemError,
    NotifyWhenFinished,
    EngineDestroyed,
    GameControllerDisconnect,
    Unknown,
}

impl StopReason {
    /// Map the platform's raw reason code.
    ///
    /// Codes follow `CHHapticEngine.StoppedReason`; anything unrecognised is
    /// `Unknown`.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            1 => StopReason::AudioSessionInterrupt,
            2 => StopReason::ApplicationSuspended,
            3 => StopReason::IdleTimeout,
            4 => StopReason::NotifyWhenFinished,
            5 => StopReason::EngineDestroyed,
            6 => StopReason::GameControllerDisconnect,
            -1 => StopReason::SystemError,
            _ => StopReason::Unknown,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            StopReason::AudioSessionInterrupt => "Audio session interrupt",
            StopReason::ApplicationSuspended => "Application suspended",
            StopReason::IdleTimeout => "Idle timeout",
            StopReason::SystemError => "System error",
            StopReason::NotifyWhenFinished => "Playback finished",
            StopReason::EngineDestroyed => "Engine destroyed",
            StopReason::GameControllerDisconnect => "Game controller disconnect",
            StopReason::Unknown => "Unknown error",
        }
    }
}

/// Message delivered to the lifecycle manager's inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineNotification {
    Stopped(StopReason),
    Reset,
}

/// Sending half of the lifecycle inbox, handed to backends.
#[derive(Debug, Clone)]
pub struct EngineNotifier {
    tx: mpsc::UnboundedSender<EngineNotification>,
}

impl EngineNotifier {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineNotification>) -> Self {
        Self { tx }
    }

    /// Report that the engine stopped.
    pub fn stopped(&self, reason: StopReason) {
        self.send(EngineNotification::Stopped(reason));
    }

    /// Report that the engine was reset and needs a restart.
    pub fn reset(&self) {
        self.send(EngineNotification::Reset);
    }

    fn send(&self, notification: EngineNotification) {
        if self.tx.send(notification).is_err() {
            log::debug!(
                "[Engine] Dropping {:?}: lifecycle manager is gone",
                notification
            );
        }
    }
}
