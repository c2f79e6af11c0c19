//! Retry policies and the per-call retry state machine.
//!
//! The One API answers `429 Too Many Requests` when a key exceeds its quota,
//! and that case gets its own, more patient policy. Every other 4xx is retried
//! under a separate generic policy. 5xx responses are never retried.

use http::StatusCode;
use std::fmt;
use std::time::Duration;

/// A bounded fixed-delay retry policy.
///
/// # Examples
///
/// ```
/// use lotr::RetryPolicy;
/// use std::time::Duration;
///
/// // up to 3 retries, one second apart
/// let policy = RetryPolicy::new(3, Duration::from_secs(1));
/// assert_eq!(policy.max_retries, 3);
///
/// // never retry
/// assert_eq!(RetryPolicy::none().max_retries, 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// How many times a request may be repeated after its first attempt.
    pub max_retries: usize,
    /// How long to wait before each repeat.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: usize, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

/// The two independent policies a client retries with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    /// Applied to `429 Too Many Requests`.
    pub rate_limit: RetryPolicy,
    /// Applied to every other 4xx, and to 429 once `rate_limit` is spent.
    pub generic: RetryPolicy,
}

impl RetryPolicies {
    pub const DEFAULT_RATE_LIMIT: RetryPolicy = RetryPolicy::new(10, Duration::from_secs(10));
    pub const DEFAULT_GENERIC: RetryPolicy = RetryPolicy::new(3, Duration::from_secs(5));
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            rate_limit: Self::DEFAULT_RATE_LIMIT,
            generic: Self::DEFAULT_GENERIC,
        }
    }
}

/// Which policy scheduled a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    RateLimited,
    ClientError,
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryReason::RateLimited => f.write_str("rate limited"),
            RetryReason::ClientError => f.write_str("client error"),
        }
    }
}

/// What to do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Below 400: decode the body.
    Success,
    /// Wait `delay`, then repeat the same request.
    Retry {
        delay: Duration,
        reason: RetryReason,
    },
    /// 5xx: fail at once.
    ServerFailed,
    /// 4xx with no budget left: fail.
    Aborted,
}

/// Retry counters for one logical call.
///
/// The rate-limit and generic budgets are counted separately, so a call can
/// use all of its rate-limit retries and still have its generic retries left.
#[derive(Debug)]
pub struct RetryBudget {
    policies: RetryPolicies,
    rate_limited: usize,
    generic: usize,
}

impl RetryBudget {
    pub fn new(policies: RetryPolicies) -> Self {
        Self {
            policies,
            rate_limited: 0,
            generic: 0,
        }
    }

    /// Classifies `status` and, when it schedules a retry, charges the
    /// matching budget.
    ///
    /// ```
    /// use lotr::retry::{RetryBudget, RetryPolicies, RetryPolicy, RetryReason, Verdict};
    /// use http::StatusCode;
    /// use std::time::Duration;
    ///
    /// let mut budget = RetryBudget::new(RetryPolicies {
    ///     rate_limit: RetryPolicy::new(1, Duration::from_secs(10)),
    ///     generic: RetryPolicy::none(),
    /// });
    ///
    /// assert_eq!(
    ///     budget.next(StatusCode::TOO_MANY_REQUESTS),
    ///     Verdict::Retry { delay: Duration::from_secs(10), reason: RetryReason::RateLimited },
    /// );
    /// assert_eq!(budget.next(StatusCode::TOO_MANY_REQUESTS), Verdict::Aborted);
    /// ```
    pub fn next(&mut self, status: StatusCode) -> Verdict {
        if status.as_u16() < 400 {
            return Verdict::Success;
        }
        if status.is_server_error() || status.as_u16() >= 600 {
            return Verdict::ServerFailed;
        }

        let rate_limit = self.policies.rate_limit;
        if status == StatusCode::TOO_MANY_REQUESTS && self.rate_limited < rate_limit.max_retries {
            self.rate_limited += 1;
            return Verdict::Retry {
                delay: rate_limit.delay,
                reason: RetryReason::RateLimited,
            };
        }

        let generic = self.policies.generic;
        if self.generic < generic.max_retries {
            self.generic += 1;
            return Verdict::Retry {
                delay: generic.delay,
                reason: RetryReason::ClientError,
            };
        }

        Verdict::Aborted
    }

    /// Total retries scheduled so far.
    pub fn retries(&self) -> usize {
        self.rate_limited + self.generic
    }
}
