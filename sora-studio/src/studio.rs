//! Studio — the single task that owns the gallery and the simulator.
//!
//! Commands come in over an mpsc channel, state changes go out as
//! [`StudioEvent`]s. A running job has two timers, the progress ticker and the
//! completion deadline. Both live in this loop and are dropped together the
//! moment the deadline fires.
//!
//! The loop ends when the command channel closes (after any job in flight has
//! settled) or when shutdown is signalled (abandoning the job).

use std::pin::Pin;
use std::time::Duration;

use sora_core::{
    Clock, GalleryStore, GenerationSimulator, KeyValueStore, RandomSource, Rejection,
    VideoRecord,
};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, Interval, MissedTickBehavior, Sleep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioCommand {
    Generate { prompt: String },
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StudioEvent {
    Started { prompt: String, duration: Duration },
    Rejected { prompt: String, reason: Rejection },
    Progress { percent: f64 },
    Completed { record: VideoRecord },
    Settled,
    Deleted { id: String, removed: bool },
    StorageFailed { error: String },
}

pub struct Studio<C: Clock, R: RandomSource, K: KeyValueStore> {
    simulator: GenerationSimulator<C, R>,
    gallery: GalleryStore<K>,
    events: mpsc::UnboundedSender<StudioEvent>,
}

/// Timers of the job in flight.
#[derive(Default)]
struct JobTimers {
    ticker: Option<Interval>,
    deadline: Option<Pin<Box<Sleep>>>,
    settle: Option<Pin<Box<Sleep>>>,
}

impl JobTimers {
    fn is_empty(&self) -> bool {
        self.ticker.is_none() && self.deadline.is_none() && self.settle.is_none()
    }
}

impl<C: Clock, R: RandomSource, K: KeyValueStore> Studio<C, R, K> {
    pub fn new(
        mut simulator: GenerationSimulator<C, R>,
        gallery: GalleryStore<K>,
        events: mpsc::UnboundedSender<StudioEvent>,
    ) -> Self {
        simulator.raise_id_floor(gallery.newest_id_millis());
        Self {
            simulator,
            gallery,
            events,
        }
    }

    /// Run until the command channel closes or shutdown fires. Hands the
    /// gallery back to the caller.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<StudioCommand>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> GalleryStore<K> {
        let mut timers = JobTimers::default();
        let mut draining = false;

        tracing::info!("Studio started ({} videos in gallery)", self.gallery.len());

        loop {
            if draining && timers.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    if self.simulator.is_busy() {
                        tracing::warn!("Shutdown during generation, job abandoned");
                    }
                    break;
                }
                _ = wait_sleep(&mut timers.deadline) => {
                    self.on_deadline(&mut timers);
                }
                _ = wait_sleep(&mut timers.settle) => {
                    timers.settle = None;
                    if self.simulator.settle() {
                        self.emit(StudioEvent::Settled);
                    }
                }
                _ = wait_tick(&mut timers.ticker) => {
                    if let Some(percent) = self.simulator.tick() {
                        self.emit(StudioEvent::Progress { percent });
                    }
                }
                cmd = commands.recv(), if !draining => match cmd {
                    Some(cmd) => self.on_command(cmd, &mut timers),
                    None => {
                        tracing::debug!("Command channel closed, draining");
                        draining = true;
                    }
                },
            }
        }

        tracing::info!("Studio stopped ({} videos in gallery)", self.gallery.len());
        self.gallery
    }

    fn on_command(&mut self, cmd: StudioCommand, timers: &mut JobTimers) {
        match cmd {
            StudioCommand::Generate { prompt } => match self.simulator.start(&prompt) {
                Ok(duration) => {
                    let period = self.simulator.config().tick_interval();
                    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
                    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                    timers.ticker = Some(ticker);
                    timers.deadline = Some(Box::pin(tokio::time::sleep(duration)));
                    self.emit(StudioEvent::Started { prompt, duration });
                }
                Err(reason) => {
                    tracing::info!("Generation rejected: {}", reason);
                    self.emit(StudioEvent::Rejected { prompt, reason });
                }
            },
            StudioCommand::Delete { id } => match self.gallery.remove(&id) {
                Ok(removed) => self.emit(StudioEvent::Deleted { id, removed }),
                Err(e) => {
                    tracing::error!("Failed to delete video {}: {}", id, e);
                    self.emit(StudioEvent::StorageFailed { error: e.to_string() });
                }
            },
        }
    }

    fn on_deadline(&mut self, timers: &mut JobTimers) {
        timers.ticker = None;
        timers.deadline = None;

        let Some(record) = self.simulator.complete() else {
            tracing::error!("Deadline fired with simulator in {:?}", self.simulator.phase());
            return;
        };
        self.emit(StudioEvent::Progress {
            percent: self.simulator.progress(),
        });

        if let Err(e) = self.gallery.add(record.clone()) {
            tracing::error!("Failed to save video {}: {}", record.id, e);
            self.emit(StudioEvent::StorageFailed { error: e.to_string() });
        }
        self.emit(StudioEvent::Completed { record });

        let settle_delay = self.simulator.config().settle_delay();
        timers.settle = Some(Box::pin(tokio::time::sleep(settle_delay)));
    }

    fn emit(&self, event: StudioEvent) {
        // Nobody listening is fine; the studio keeps running headless.
        let _ = self.events.send(event);
    }
}

async fn wait_sleep(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(s) => s.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn wait_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
