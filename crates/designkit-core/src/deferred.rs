//! Deferred requests guarded by generation tokens.
//!
//! A scheduled request carries the generation it was issued under. Issuing
//! a newer request bumps the generation, so a superseded request can never
//! fire and clobber the newer one.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// Identifies one scheduled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken {
    generation: u64,
}

/// Source of monotonically increasing request tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenSource {
    generation: u64,
}

impl TokenSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token, invalidating every earlier one.
    pub fn issue(&mut self) -> RequestToken {
        self.generation += 1;
        RequestToken {
            generation: self.generation,
        }
    }

    /// Invalidate every outstanding token without issuing a new one.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    /// Check if a token is still the most recent request.
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.generation == self.generation
    }
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    token: RequestToken,
    due: Instant,
}

/// Coalesces bursts of requests into one, fired after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    tokens: TokenSource,
    pending: Option<Pending>,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            tokens: TokenSource::new(),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule a request at `now`, superseding any pending one.
    pub fn schedule(&mut self, now: Instant) -> RequestToken {
        let token = self.tokens.issue();
        self.pending = Some(Pending {
            token,
            due: now + self.delay,
        });
        token
    }

    /// Drop the pending request, if any.
    pub fn cancel(&mut self) {
        self.tokens.invalidate();
        self.pending = None;
    }

    /// Check if a request is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Check if a token is still the most recent request. Holders of an
    /// older token know their request was superseded.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.tokens.is_current(token)
    }

    /// Fire the pending request if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<RequestToken> {
        let pending = self.pending?;
        if now < pending.due {
            return None;
        }
        self.pending = None;
        Some(pending.token)
    }

    /// Fire the pending request immediately, regardless of the delay.
    pub fn flush(&mut self) -> Option<RequestToken> {
        self.pending.take().map(|p| p.token)
    }
}

/// Limits an action to at most once per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Returns true (and records `now`) if the action may run.
    pub fn ready(&mut self, now: Instant) -> bool {
        let ready = match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        };
        if ready {
            self.last = Some(now);
        }
        ready
    }

    /// Forget the last run so the next call is always ready.
    pub fn reset(&mut self) {
        self.last = None;
    }
}
