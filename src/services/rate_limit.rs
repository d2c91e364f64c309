// Per-client request rate limiting
// In-process token bucket keyed by client IP (governor)

use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use std::{net::IpAddr, num::NonZeroU32, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::app_config::SecurityConfig;

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed in the time window
    pub max_requests: u32,

    /// Time window in seconds
    pub window_seconds: u64,
}

impl RateLimitConfig {
    pub fn from_security(security: &SecurityConfig) -> Self {
        Self {
            max_requests: security.rate_limit_max_requests,
            window_seconds: security.rate_limit_window_seconds,
        }
    }

    /// `max_requests` spread evenly over the window, with the whole allowance
    /// available as an initial burst
    fn quota(&self) -> Result<Quota, RateLimitError> {
        let burst = NonZeroU32::new(self.max_requests)
            .ok_or_else(|| RateLimitError::Config("max_requests must be > 0".to_string()))?;
        if self.window_seconds == 0 {
            return Err(RateLimitError::Config("window_seconds must be > 0".to_string()));
        }

        let period = Duration::from_secs(self.window_seconds) / self.max_requests;
        let quota = Quota::with_period(period)
            .ok_or_else(|| RateLimitError::Config("replenish period rounds to zero".to_string()))?;
        Ok(quota.allow_burst(burst))
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

pub struct IpRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl IpRateLimiter {
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimitError> {
        let limiter = RateLimiter::keyed(config.quota()?);
        Ok(Self {
            limiter,
            clock: DefaultClock::default(),
        })
    }

    pub fn check(&self, ip: IpAddr) -> RateLimitDecision {
        match self.limiter.check_key(&ip) {
            Ok(()) => RateLimitDecision::Allowed,
            Err(not_until) => {
                let retry_after = not_until.wait_time_from(self.clock.now());
                debug!(client_ip = %ip, retry_after_secs = retry_after.as_secs(), "Rate limit hit");
                RateLimitDecision::Limited { retry_after }
            },
        }
    }

    /// Drop state for clients whose buckets have fully refilled
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(max_requests: u32, window_seconds: u64) -> IpRateLimiter {
        IpRateLimiter::new(RateLimitConfig {
            max_requests,
            window_seconds,
        })
        .unwrap()
    }

    #[test]
    fn test_burst_up_to_max_then_limited() {
        let limiter = limiter(3, 900);
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        for _ in 0..3 {
            assert_eq!(limiter.check(ip), RateLimitDecision::Allowed);
        }
        assert!(matches!(
            limiter.check(ip),
            RateLimitDecision::Limited { retry_after } if retry_after > Duration::ZERO
        ));
    }

    #[test]
    fn test_clients_are_limited_independently() {
        let limiter = limiter(1, 900);
        let a = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let b = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

        assert_eq!(limiter.check(a), RateLimitDecision::Allowed);
        assert_ne!(limiter.check(a), RateLimitDecision::Allowed);
        assert_eq!(limiter.check(b), RateLimitDecision::Allowed);
    }

    #[test]
    fn test_zero_values_rejected() {
        assert!(IpRateLimiter::new(RateLimitConfig {
            max_requests: 0,
            window_seconds: 900
        })
        .is_err());
        assert!(IpRateLimiter::new(RateLimitConfig {
            max_requests: 10,
            window_seconds: 0
        })
        .is_err());
    }
}
