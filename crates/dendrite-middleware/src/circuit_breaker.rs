//! Consecutive-failure circuit breaker.
//!
//! ```text
//!   Closed ──(threshold failures)──► Open ──(reset_timeout)──► HalfOpen
//!     ▲                               ▲                          │
//!     └──────────(probe ok)───────────┴──────(probe fails)───────┘
//! ```
//!
//! While open, calls fail fast with [`DendriteError::CircuitOpen`] without
//! reaching the inner stage. In the half-open state exactly one probe is let
//! through; concurrent calls keep failing fast until it settles. A probe
//! whose future is dropped before it settles (an outer timeout, a caller
//! giving up) counts as failed and reopens the circuit.
//!
//! The breaker state lives in the layer, so every pipeline built from the
//! same `CircuitBreaker` shares it.
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

use dendrite_core::{
    DendriteError, Result,
    pipeline::{Layer, Stage, SynapseRequest},
};
use futures_core::future::BoxFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Breaker {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    reset_timeout: Duration,
    breaker: Arc<Mutex<Breaker>>,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            breaker: Arc::new(Mutex::new(Breaker {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            })),
        }
    }

    /// Current state, with an expired open period reported as half-open.
    pub fn state(&self) -> CircuitState {
        let breaker = lock(&self.breaker);
        match (breaker.state, breaker.opened_at) {
            (CircuitState::Open, Some(at)) if at.elapsed() >= self.reset_timeout => {
                CircuitState::HalfOpen
            }
            (state, _) => state,
        }
    }
}

impl Layer for CircuitBreaker {
    fn layer(&self, inner: Arc<dyn Stage>) -> Arc<dyn Stage> {
        Arc::new(CircuitBreakerStage {
            inner,
            config: self.clone(),
        })
    }
}

struct CircuitBreakerStage {
    inner: Arc<dyn Stage>,
    config: CircuitBreaker,
}

impl CircuitBreakerStage {
    /// Decide whether a call may proceed; returns whether it is the probe.
    fn admit(&self) -> Result<bool> {
        let mut breaker = lock(&self.config.breaker);
        match breaker.state {
            CircuitState::Closed => Ok(false),
            CircuitState::Open => {
                let expired = breaker
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.reset_timeout);
                if !expired {
                    return Err(DendriteError::CircuitOpen);
                }
                breaker.state = CircuitState::HalfOpen;
                breaker.probe_in_flight = true;
                Ok(true)
            }
            CircuitState::HalfOpen if breaker.probe_in_flight => Err(DendriteError::CircuitOpen),
            CircuitState::HalfOpen => {
                breaker.probe_in_flight = true;
                Ok(true)
            }
        }
    }

    fn record(&self, probe: bool, result: &Result<SynapseRequest>) {
        let mut breaker = lock(&self.config.breaker);
        if probe {
            breaker.probe_in_flight = false;
        }
        match result {
            Ok(_) => {
                if breaker.state != CircuitState::Closed {
                    tracing::debug!("circuit breaker closed");
                }
                breaker.state = CircuitState::Closed;
                breaker.consecutive_failures = 0;
                breaker.opened_at = None;
            }
            // The caller gave up; says nothing about the provider's health.
            Err(DendriteError::Cancelled) => {
                if probe {
                    breaker.state = CircuitState::HalfOpen;
                }
            }
            Err(err) => {
                breaker.consecutive_failures = breaker.consecutive_failures.saturating_add(1);
                if probe || breaker.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(
                        failures = breaker.consecutive_failures,
                        reset_ms = self.config.reset_timeout.as_millis() as u64,
                        error = %err,
                        "circuit breaker opened"
                    );
                    breaker.state = CircuitState::Open;
                    breaker.opened_at = Some(Instant::now());
                }
            }
        }
    }
}

/// Reopens the circuit if the probe is dropped before it was recorded.
struct ProbeGuard<'a> {
    breaker: &'a Mutex<Breaker>,
    armed: bool,
}

impl ProbeGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ProbeGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut breaker = lock(self.breaker);
        breaker.probe_in_flight = false;
        breaker.state = CircuitState::Open;
        breaker.opened_at = Some(Instant::now());
        tracing::warn!("circuit breaker probe abandoned, reopening");
    }
}

impl Stage for CircuitBreakerStage {
    fn process<'a>(&'a self, request: SynapseRequest) -> BoxFuture<'a, Result<SynapseRequest>> {
        Box::pin(async move {
            let probe = self.admit()?;
            let guard = probe.then(|| ProbeGuard {
                breaker: &self.config.breaker,
                armed: true,
            });
            let result = self.inner.process(request).await;
            self.record(probe, &result);
            if let Some(guard) = guard {
                guard.disarm();
            }
            result
        })
    }
}

fn lock(breaker: &Mutex<Breaker>) -> MutexGuard<'_, Breaker> {
    breaker
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
