//! Generation Simulator — a fake multi-second video job.
//!
//! ```text
//!   start()        complete()          settle()
//! Idle ──────► Running ──────► Completing ──────► Idle
//!               │  ▲
//!               └──┘ tick(): progress += U[0,1) × max_increment, capped
//! ```
//!
//! This type is the pure state machine. It owns no timers: whoever drives it
//! calls `tick()` on every interval, `complete()` when the duration returned
//! by `start()` has elapsed, and `settle()` after the settle delay.

use std::time::Duration;

use crate::clock::Clock;
use crate::config::GenerationConfig;
use crate::error::Rejection;
use crate::models::VideoRecord;
use crate::payload::{GradientDescriptor, PALETTE};
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Running,
    Completing,
}

pub struct GenerationSimulator<C: Clock, R: RandomSource> {
    config: GenerationConfig,
    clock: C,
    rng: R,
    phase: JobPhase,
    progress: f64,
    prompt: String,
    last_id_millis: Option<i64>,
}

impl<C: Clock, R: RandomSource> GenerationSimulator<C, R> {
    pub fn new(config: GenerationConfig, clock: C, rng: R) -> Self {
        Self {
            config,
            clock,
            rng,
            phase: JobPhase::Idle,
            progress: 0.0,
            prompt: String::new(),
            last_id_millis: None,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// Progress in percent, `0.0..=100.0`.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Prompt of the current job; empty when idle.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn is_busy(&self) -> bool {
        self.phase != JobPhase::Idle
    }

    /// Make sure future ids sort after `millis` (e.g. the newest stored id).
    pub fn raise_id_floor(&mut self, millis: Option<i64>) {
        self.last_id_millis = match (self.last_id_millis, millis) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }

    /// Begin a job for `prompt`. Returns how long the job will run.
    pub fn start(&mut self, prompt: &str) -> Result<Duration, Rejection> {
        if self.is_busy() {
            tracing::debug!("Generation rejected: {:?} in progress", self.phase);
            return Err(Rejection::AlreadyRunning);
        }
        if prompt.trim().is_empty() {
            return Err(Rejection::EmptyPrompt);
        }

        let window = self.config.max_duration_ms.saturating_sub(self.config.min_duration_ms);
        let extra = (self.rng.next_unit() * window as f64) as u64;
        let duration = Duration::from_millis(self.config.min_duration_ms + extra.min(window));

        self.phase = JobPhase::Running;
        self.progress = 0.0;
        self.prompt = prompt.to_string();

        tracing::info!(
            "Generation started ({} ms): {:?}",
            duration.as_millis(),
            crate::payload::excerpt(prompt, self.config.excerpt_chars)
        );
        Ok(duration)
    }

    /// Advance progress by one random step. `None` unless running.
    pub fn tick(&mut self) -> Option<f64> {
        if self.phase != JobPhase::Running {
            return None;
        }
        let step = self.rng.next_unit() * self.config.max_increment;
        self.progress = (self.progress + step).min(self.config.progress_cap);
        Some(self.progress)
    }

    /// Finish the running job: progress jumps to 100 and the record is built.
    /// `None` unless running.
    pub fn complete(&mut self) -> Option<VideoRecord> {
        if self.phase != JobPhase::Running {
            return None;
        }

        let colors = PALETTE[self.rng.pick(PALETTE.len())];
        let descriptor = GradientDescriptor::new(colors, &self.prompt, self.config.excerpt_chars);
        let created_at = self.clock.now();
        let id = self.issue_id(created_at.timestamp_millis());

        self.phase = JobPhase::Completing;
        self.progress = 100.0;

        tracing::info!("Generation complete: video {} ({} → {})", id, colors[0], colors[1]);

        Some(VideoRecord {
            id,
            prompt: self.prompt.clone(),
            payload: descriptor.to_data_url(),
            created_at,
        })
    }

    /// Return to idle after completion: progress back to 0, prompt cleared.
    pub fn settle(&mut self) -> bool {
        if self.phase != JobPhase::Completing {
            return false;
        }
        self.phase = JobPhase::Idle;
        self.progress = 0.0;
        self.prompt.clear();
        true
    }

    fn issue_id(&mut self, now_millis: i64) -> String {
        let millis = match self.last_id_millis {
            Some(last) if now_millis <= last => last + 1,
            _ => now_millis,
        };
        self.last_id_millis = Some(millis);
        millis.to_string()
    }
}
