//! Login rate limiting
//!
//! Attempts are tracked per email in memory. [`MAX_ATTEMPTS`] failures
//! within a minute of the last try block the email for ten minutes.

use chrono::{DateTime, Duration, Utc};
use mobileorder_core::{Error, Result};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

pub const MAX_ATTEMPTS: u32 = 5;
const ATTEMPT_WINDOW_SECS: i64 = 60;
const BLOCK_SECS: i64 = 10 * 60;
const RETENTION_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
struct LoginAttempt {
    attempts: u32,
    last_try: DateTime<Utc>,
    blocked_at: Option<DateTime<Utc>>,
}

impl LoginAttempt {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            attempts: 0,
            last_try: now,
            blocked_at: None,
        }
    }
}

/// In-memory login rate limiter
#[derive(Debug, Default)]
pub struct RateLimiter {
    attempts: Mutex<HashMap<String, LoginAttempt>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, LoginAttempt>> {
        // The map stays consistent even if a holder panicked
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Check whether a login for `email` may proceed
    pub fn check(&self, email: &str) -> Result<()> {
        self.check_at(email, Utc::now())
    }

    pub fn check_at(&self, email: &str, now: DateTime<Utc>) -> Result<()> {
        let mut entries = self.entries();

        let Some(attempt) = entries.get_mut(email) else {
            entries.insert(email.to_string(), LoginAttempt::fresh(now));
            return Ok(());
        };

        if let Some(blocked_at) = attempt.blocked_at {
            if now - blocked_at < Duration::seconds(BLOCK_SECS) {
                debug!(email = %email, "Login attempt while blocked");
                return Err(Error::Forbidden(
                    "アクセスが一時的にブロックされています。10分後に再試行してください。".to_string(),
                ));
            }
            attempt.blocked_at = None;
            attempt.attempts = 0;
        }

        if now - attempt.last_try < Duration::seconds(ATTEMPT_WINDOW_SECS) {
            if attempt.attempts >= MAX_ATTEMPTS {
                attempt.blocked_at = Some(now);
                warn!(email = %email, attempts = attempt.attempts, "Blocking login attempts");
                return Err(Error::Forbidden(
                    "短時間に多数のアクセスが検出されました。10分後に再試行してください。".to_string(),
                ));
            }
        } else {
            attempt.attempts = 0;
        }

        Ok(())
    }

    /// Record the outcome of a login attempt
    pub fn record(&self, email: &str, success: bool) {
        self.record_at(email, success, Utc::now())
    }

    pub fn record_at(&self, email: &str, success: bool, now: DateTime<Utc>) {
        let mut entries = self.entries();
        let attempt = entries
            .entry(email.to_string())
            .or_insert_with(|| LoginAttempt::fresh(now));

        attempt.last_try = now;
        if success {
            attempt.attempts = 0;
            attempt.blocked_at = None;
        } else {
            attempt.attempts += 1;
        }
    }

    /// Drop entries whose last try is older than 24 hours
    pub fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now())
    }

    pub fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::seconds(RETENTION_SECS);
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, attempt| attempt.last_try >= cutoff);
        let removed = before - entries.len();
        if removed > 0 {
            info!(removed, "Cleaned up stale login attempts");
        }
        removed
    }

    /// Number of tracked emails
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mobileorder_core::ErrCode;

    const EMAIL: &str = "user@example.com";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 14, 10, 0, 0).unwrap()
    }

    fn fail_times(limiter: &RateLimiter, n: u32, now: DateTime<Utc>) {
        for _ in 0..n {
            limiter.check_at(EMAIL, now).unwrap();
            limiter.record_at(EMAIL, false, now);
        }
    }

    #[test]
    fn test_first_attempt_is_allowed_and_tracked() {
        let limiter = RateLimiter::new();
        assert!(limiter.check_at(EMAIL, t0()).is_ok());
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_blocks_after_five_quick_failures() {
        let limiter = RateLimiter::new();
        fail_times(&limiter, 5, t0());

        let err = limiter.check_at(EMAIL, t0() + Duration::seconds(10)).unwrap_err();
        assert_eq!(err.code(), ErrCode::Forbidden);

        // Still blocked nine minutes later
        let err = limiter.check_at(EMAIL, t0() + Duration::minutes(9)).unwrap_err();
        assert_eq!(err.code(), ErrCode::Forbidden);

        // Block expires after ten minutes
        assert!(limiter.check_at(EMAIL, t0() + Duration::minutes(11)).is_ok());
    }

    #[test]
    fn test_slow_failures_reset_counter() {
        let limiter = RateLimiter::new();
        fail_times(&limiter, 4, t0());

        // A minute later the counter starts over
        let later = t0() + Duration::minutes(2);
        fail_times(&limiter, 4, later);
        assert!(limiter.check_at(EMAIL, later + Duration::seconds(1)).is_ok());
    }

    #[test]
    fn test_success_clears_failures() {
        let limiter = RateLimiter::new();
        fail_times(&limiter, 4, t0());
        limiter.record_at(EMAIL, true, t0());
        fail_times(&limiter, 4, t0());
        assert!(limiter.check_at(EMAIL, t0()).is_ok());
    }

    #[test]
    fn test_emails_are_independent() {
        let limiter = RateLimiter::new();
        fail_times(&limiter, 5, t0());
        assert!(limiter.check_at(EMAIL, t0()).is_err());
        assert!(limiter.check_at("other@example.com", t0()).is_ok());
    }

    #[test]
    fn test_cleanup_drops_stale_entries() {
        let limiter = RateLimiter::new();
        limiter.record_at("old@example.com", false, t0());
        limiter.record_at(EMAIL, false, t0() + Duration::hours(20));

        let removed = limiter.cleanup_at(t0() + Duration::hours(25));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }
}
