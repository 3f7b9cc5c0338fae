use tokio::time::Duration;

use crate::config::ReconnectSection;

/// Capped exponential reconnect delays.
///
/// Attempt 1 runs immediately (most drops are transient); attempt `n >= 2`
/// waits `initial * multiplier^(n-2)`, capped at `max`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: f64,
    /// 0 = unlimited.
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub fn from_config(cfg: &ReconnectSection) -> Self {
        Self {
            initial: Duration::from_millis(cfg.initial_backoff_ms),
            max: Duration::from_millis(cfg.max_backoff_ms),
            multiplier: cfg.multiplier,
            max_attempts: cfg.max_attempts,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(2).min(64) as i32;
        let secs = self.initial.as_secs_f64() * self.multiplier.powi(exp);
        if !secs.is_finite() || secs >= self.max.as_secs_f64() {
            return self.max;
        }
        Duration::from_secs_f64(secs)
    }

    pub fn allows(&self, attempt: u32) -> bool {
        self.max_attempts == 0 || attempt <= self.max_attempts
    }
}
