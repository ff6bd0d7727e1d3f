//! Bounded reconnection policy.
//!
//! The transport consults [`ReconnectState`] after every lost connection or
//! failed attempt. The policy caps both the number of attempts and the delay
//! between them, so a dead service never causes an unbounded retry storm.

use std::time::Duration;

/// How many times to retry and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Attempts before giving up (default 5).
    pub max_attempts: u32,
    /// Delay before the first attempt (default 1s).
    pub base_delay: Duration,
    /// Upper bound for any single delay (default 10s).
    pub max_delay: Duration,
    /// Relative jitter applied to each delay, 0.0..=1.0 (default 0.5).
    pub randomization: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            randomization: 0.5,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the given 1-based attempt, with random jitter.
    ///
    /// Formula: min(max_delay, base * 2^(attempt-1) +/- randomization)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.delay_with_jitter(attempt, random_unit(), random_bit())
    }

    /// Deterministic core of [`delay_for`](Self::delay_for).
    ///
    /// `unit` is a jitter sample in `0.0..1.0`; `add` picks the direction.
    pub fn delay_with_jitter(&self, attempt: u32, unit: f64, add: bool) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let base_ms = self.base_delay.as_millis() as f64 * f64::from(1u32 << exponent);
        let deviation = base_ms * self.randomization.clamp(0.0, 1.0) * unit.clamp(0.0, 1.0);
        let ms = if add {
            base_ms + deviation
        } else {
            base_ms - deviation
        };
        let max_ms = self.max_delay.as_millis() as f64;
        Duration::from_millis(ms.clamp(0.0, max_ms) as u64)
    }
}

/// Where the transport is in its retry schedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReconnectState {
    /// Connected, or never connected yet.
    #[default]
    Idle,
    /// Waiting for / running the given attempt.
    Retrying {
        /// 1-based attempt number.
        attempt: u32,
    },
    /// All attempts used; the caller must start over.
    Exhausted,
}

/// What the transport should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectAction {
    /// Sleep for `delay`, then make attempt number `attempt`.
    Wait {
        /// 1-based attempt number.
        attempt: u32,
        /// How long to wait first.
        delay: Duration,
    },
    /// Stop retrying.
    GiveUp,
}

impl ReconnectState {
    /// Record a lost connection or failed attempt.
    pub fn on_failure(self, policy: &ReconnectPolicy) -> (Self, ReconnectAction) {
        let next = match self {
            Self::Idle => 1,
            Self::Retrying { attempt } => attempt.saturating_add(1),
            Self::Exhausted => return (Self::Exhausted, ReconnectAction::GiveUp),
        };

        if next > policy.max_attempts {
            return (Self::Exhausted, ReconnectAction::GiveUp);
        }

        (
            Self::Retrying { attempt: next },
            ReconnectAction::Wait {
                attempt: next,
                delay: policy.delay_for(next),
            },
        )
    }

    /// Record a successful connection; the schedule starts over.
    pub fn on_success(self) -> Self {
        Self::Idle
    }

    /// The attempt currently in flight, if retrying.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Retrying { attempt } => Some(*attempt),
            _ => None,
        }
    }
}

/// Random sample in `0.0..1.0`. Falls back to the midpoint if the OS RNG is
/// unavailable.
fn random_unit() -> f64 {
    let mut bytes = [0u8; 8];
    if getrandom::getrandom(&mut bytes).is_err() {
        return 0.5;
    }
    (u64::from_le_bytes(bytes) >> 11) as f64 / (1u64 << 53) as f64
}

fn random_bit() -> bool {
    let mut byte = [0u8; 1];
    getrandom::getrandom(&mut byte).is_ok() && byte[0] & 1 == 1
}
