// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Walk session timer and simulated stats.
//!
//! While a walk is active two tasks run: a 1 s ticker keeping `duration`
//! in whole seconds since start, and a 2 s ticker adding 1-5 simulated
//! steps and recomputing distance and calories from the step count.
//! Nothing is persisted.

use crate::models::WalkStats;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

const DURATION_TICK: Duration = Duration::from_secs(1);
const STATS_TICK: Duration = Duration::from_secs(2);

/// Miles per simulated step.
const MILES_PER_STEP: f64 = 0.0005;
/// Calories per simulated step.
const CALORIES_PER_STEP: f64 = 0.04;

/// Source of the steps added on each stats tick.
pub trait StepSource: Send + Sync + 'static {
    fn next_steps(&self) -> u64;
}

/// Uniformly random 1-5 steps per tick.
pub struct RandomSteps;

impl StepSource for RandomSteps {
    fn next_steps(&self) -> u64 {
        rand::thread_rng().gen_range(1..=5)
    }
}

/// Externally visible walk state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WalkState {
    Idle,
    Active { started_at: DateTime<Utc> },
}

#[derive(Debug, Default)]
struct Shared {
    /// Bumped on every start; ticks for older sessions are ignored
    session: u64,
    started_at: Option<DateTime<Utc>>,
    stats: WalkStats,
}

impl Shared {
    fn is_current(&self, session: u64) -> bool {
        self.started_at.is_some() && self.session == session
    }
}

/// One user's walk simulator.
pub struct WalkSimulator {
    shared: Arc<Mutex<Shared>>,
    steps: Arc<dyn StepSource>,
    tickers: Vec<JoinHandle<()>>,
}

impl Default for WalkSimulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply one stats tick.
fn add_steps(stats: &mut WalkStats, steps: u64) {
    stats.steps += steps;
    stats.distance = stats.steps as f64 * MILES_PER_STEP;
    stats.calories = (stats.steps as f64 * CALORIES_PER_STEP).floor() as u64;
}

impl WalkSimulator {
    pub fn new() -> Self {
        Self::with_steps(Arc::new(RandomSteps))
    }

    pub fn with_steps(steps: Arc<dyn StepSource>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            steps,
            tickers: Vec::new(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn stop_tickers(&mut self) {
        for ticker in self.tickers.drain(..) {
            ticker.abort();
        }
    }

    /// Start a walk from zero. Restarts the walk if one is active.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) -> DateTime<Utc> {
        self.stop_tickers();

        let start = Instant::now();
        let started_at = Utc::now();
        let session = {
            let mut shared = self.lock();
            shared.session += 1;
            shared.started_at = Some(started_at);
            shared.stats = WalkStats::default();
            shared.session
        };

        let shared = self.shared.clone();
        let duration_ticker = tokio::spawn(async move {
            let mut ticker = interval_at(start + DURATION_TICK, DURATION_TICK);
            loop {
                let now = ticker.tick().await;
                let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());
                if !shared.is_current(session) {
                    break;
                }
                shared.stats.duration = now.duration_since(start).as_secs();
            }
        });

        let shared = self.shared.clone();
        let steps = self.steps.clone();
        let stats_ticker = tokio::spawn(async move {
            let mut ticker = interval_at(start + STATS_TICK, STATS_TICK);
            loop {
                ticker.tick().await;
                let mut shared = shared.lock().unwrap_or_else(|e| e.into_inner());
                if !shared.is_current(session) {
                    break;
                }
                add_steps(&mut shared.stats, steps.next_steps());
            }
        });

        self.tickers = vec![duration_ticker, stats_ticker];
        tracing::info!(session, "Walk started");
        started_at
    }

    /// End the active walk and return its final stats.
    ///
    /// `None` when no walk is active.
    pub fn end(&mut self) -> Option<WalkStats> {
        let (session, stats) = {
            let mut shared = self.lock();
            shared.started_at.take()?;
            (shared.session, shared.stats)
        };
        self.stop_tickers();

        tracing::info!(
            session,
            duration = stats.duration,
            steps = stats.steps,
            distance = stats.distance,
            calories = stats.calories,
            "Walk ended"
        );
        Some(stats)
    }

    pub fn is_active(&self) -> bool {
        self.lock().started_at.is_some()
    }

    pub fn state(&self) -> WalkState {
        match self.lock().started_at {
            Some(started_at) => WalkState::Active { started_at },
            None => WalkState::Idle,
        }
    }

    /// Current stats (the final stats once ended, until the next start).
    pub fn stats(&self) -> WalkStats {
        self.lock().stats
    }
}

impl Drop for WalkSimulator {
    fn drop(&mut self) {
        self.stop_tickers();
    }
}

/// `H:MM:SS` for an hour or more, else `M:SS`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}
