use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::error::ApiError;

/// Tracked keys before stale entries are pruned.
const PRUNE_THRESHOLD: usize = 10_000;

/// Per-phone limit on OTP sends: at most `max_requests` within any `window`.
/// Once the burst is spent, one send is regained per elapsed `window`.
pub struct OtpRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
}

impl OtpRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Option<Self> {
        let burst = NonZeroU32::new(max_requests)?;
        let quota = Quota::with_period(window)?.allow_burst(burst);
        Some(Self {
            limiter: RateLimiter::keyed(quota),
        })
    }

    /// `None` when rate limiting is disabled or the quota is degenerate.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        if !config.enable_rate_limiting {
            return None;
        }
        Self::new(
            config.otp_rate_limit_requests,
            Duration::from_secs(config.otp_rate_limit_window_secs),
        )
    }

    pub fn check(&self, phone: &str) -> Result<(), ApiError> {
        if self.limiter.len() > PRUNE_THRESHOLD {
            self.limiter.retain_recent();
        }

        self.limiter.check_key(&phone.to_string()).map_err(|_| {
            tracing::warn!(phone, "OTP rate limit exceeded");
            ApiError::too_many_requests("Too many OTP requests, please try again later")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn eleventh_request_in_window_is_rejected() {
        let limiter = OtpRateLimiter::new(10, Duration::from_secs(900)).unwrap();
        for _ in 0..10 {
            limiter.check("9999999999").unwrap();
        }
        let err = limiter.check("9999999999").unwrap_err();
        assert_eq!(err.error_code(), "TOO_MANY_REQUESTS");

        // Other phones have their own allowance.
        limiter.check("8888888888").unwrap();
    }

    #[test]
    fn spent_burst_stays_spent_for_the_window() {
        let limiter = OtpRateLimiter::new(2, Duration::from_millis(600)).unwrap();
        let started = Instant::now();
        let mut allowed = 0;
        while started.elapsed() < Duration::from_millis(500) {
            if limiter.check("9999999999").is_ok() {
                allowed += 1;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(allowed, 2);

        std::thread::sleep(Duration::from_millis(700).saturating_sub(started.elapsed()));
        assert!(limiter.check("9999999999").is_ok());
        assert!(limiter.check("9999999999").is_err());
    }

    #[test]
    fn disabled_or_zero_quota_yields_none() {
        assert!(OtpRateLimiter::new(0, Duration::from_secs(900)).is_none());

        let config = ApiConfig {
            enable_rate_limiting: false,
            otp_rate_limit_requests: 10,
            otp_rate_limit_window_secs: 900,
        };
        assert!(OtpRateLimiter::from_config(&config).is_none());
    }
}
