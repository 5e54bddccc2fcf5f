use std::time::Duration;

use sora_core::{
    FileStore, GalleryStore, GenerationConfig, GenerationSimulator, GradientDescriptor,
    KeyValueStore, ManualClock, MemoryStore, Rejection, ScriptedRandom,
};
use sora_studio::studio::{Studio, StudioCommand, StudioEvent};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

const START_MILLIS: i64 = 1_700_000_000_000;

struct Harness<K: KeyValueStore + 'static> {
    commands: mpsc::Sender<StudioCommand>,
    events: mpsc::UnboundedReceiver<StudioEvent>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<GalleryStore<K>>,
}

/// Every random draw returns 0.5: 4000 ms jobs, +7.5% per tick, palette[2].
fn spawn_studio<K: KeyValueStore + 'static>(store: K) -> Harness<K> {
    let simulator = GenerationSimulator::new(
        GenerationConfig::default(),
        ManualClock::at_millis(START_MILLIS),
        ScriptedRandom::new([0.5]),
    );
    let (event_tx, events) = mpsc::unbounded_channel();
    let (commands, cmd_rx) = mpsc::channel(8);
    let (shutdown, shutdown_rx) = broadcast::channel(1);

    let studio = Studio::new(simulator, GalleryStore::load(store), event_tx);
    let task = tokio::spawn(studio.run(cmd_rx, shutdown_rx));

    Harness {
        commands,
        events,
        shutdown,
        task,
    }
}

async fn generate(commands: &mpsc::Sender<StudioCommand>, prompt: &str) {
    commands
        .send(StudioCommand::Generate {
            prompt: prompt.to_string(),
        })
        .await
        .unwrap();
}

/// Collect events up to and including the next `Settled`.
async fn until_settled(events: &mut mpsc::UnboundedReceiver<StudioEvent>) -> Vec<StudioEvent> {
    let mut seen = Vec::new();
    while let Some(event) = events.recv().await {
        let done = event == StudioEvent::Settled;
        seen.push(event);
        if done {
            break;
        }
    }
    seen
}

fn progress_values(events: &[StudioEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            StudioEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

// ============================================================================
// TEST 1: one prompt → Started, capped progress, 100, Completed, Settled
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_generation_lifecycle() {
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "cat").await;
    let seen = until_settled(&mut events).await;

    assert_eq!(
        seen[0],
        StudioEvent::Started {
            prompt: "cat".to_string(),
            duration: Duration::from_millis(4000),
        }
    );
    assert_eq!(seen.last(), Some(&StudioEvent::Settled));

    // Ticks at 200ms..=3800ms, then the forced 100
    let progress = progress_values(&seen);
    assert_eq!(progress.len(), 20, "progress events: {:?}", progress);
    let (ticks, last) = progress.split_at(19);
    assert!(ticks.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {:?}", ticks);
    assert!(ticks.iter().all(|p| *p <= 95.0));
    assert_eq!(ticks[0], 7.5);
    assert_eq!(ticks[18], 95.0);
    assert_eq!(last, [100.0]);

    // No progress after completion
    let completed_at = seen
        .iter()
        .position(|e| matches!(e, StudioEvent::Completed { .. }))
        .expect("no Completed event");
    assert!(!seen[completed_at..]
        .iter()
        .any(|e| matches!(e, StudioEvent::Progress { .. })));

    drop(commands);
    let gallery = task.await.unwrap();
    assert_eq!(gallery.len(), 1);

    let record = &gallery.records()[0];
    assert_eq!(record.prompt, "cat");
    assert_eq!(record.id, START_MILLIS.to_string());
    let descriptor = GradientDescriptor::decode(&record.payload).unwrap();
    assert_eq!(descriptor.colors, ["#4facfe".to_string(), "#00f2fe".to_string()]);
    assert_eq!(descriptor.text, "cat");

    // Stored copy matches memory
    let reloaded = GalleryStore::load(gallery.store().clone());
    assert_eq!(reloaded.records(), gallery.records());
}

// ============================================================================
// TEST 2: start while running is rejected; exactly one record
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_concurrent_start_rejected() {
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "first").await;
    generate(&commands, "second").await;
    let seen = until_settled(&mut events).await;

    assert!(seen.contains(&StudioEvent::Rejected {
        prompt: "second".to_string(),
        reason: Rejection::AlreadyRunning,
    }));
    let completed = seen
        .iter()
        .filter(|e| matches!(e, StudioEvent::Completed { .. }))
        .count();
    assert_eq!(completed, 1);

    drop(commands);
    let gallery = task.await.unwrap();
    assert_eq!(gallery.len(), 1);
    assert_eq!(gallery.records()[0].prompt, "first");
}

// ============================================================================
// TEST 3: blank prompt rejected, nothing starts
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_blank_prompt_rejected() {
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "   ").await;
    drop(commands);

    let gallery = task.await.unwrap();
    assert!(gallery.is_empty());
    assert_eq!(
        events.recv().await,
        Some(StudioEvent::Rejected {
            prompt: "   ".to_string(),
            reason: Rejection::EmptyPrompt,
        })
    );
    assert_eq!(events.recv().await, None);
}

// ============================================================================
// TEST 4: sequential jobs → newest first, unique ids
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_sequential_jobs_newest_first() {
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "A").await;
    until_settled(&mut events).await;
    generate(&commands, "B").await;
    until_settled(&mut events).await;
    drop(commands);

    let gallery = task.await.unwrap();
    let prompts: Vec<&str> = gallery.records().iter().map(|r| r.prompt.as_str()).collect();
    assert_eq!(prompts, vec!["B", "A"]);
    assert_ne!(gallery.records()[0].id, gallery.records()[1].id);
}

// ============================================================================
// TEST 5: delete through the studio, absent id is a no-op
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_delete_commands() {
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "to be deleted").await;
    until_settled(&mut events).await;

    commands
        .send(StudioCommand::Delete { id: "nope".to_string() })
        .await
        .unwrap();
    assert_eq!(
        events.recv().await,
        Some(StudioEvent::Deleted {
            id: "nope".to_string(),
            removed: false,
        })
    );

    let id = START_MILLIS.to_string();
    commands
        .send(StudioCommand::Delete { id: id.clone() })
        .await
        .unwrap();
    assert_eq!(
        events.recv().await,
        Some(StudioEvent::Deleted { id, removed: true })
    );

    drop(commands);
    let gallery = task.await.unwrap();
    assert!(gallery.is_empty());
    assert!(GalleryStore::load(gallery.store().clone()).is_empty());
}

// ============================================================================
// TEST 6: closing the command channel mid-job still finishes the job
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_drain_finishes_in_flight_job() {
    let Harness {
        commands,
        events: _events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "finish me").await;
    drop(commands);

    let gallery = task.await.unwrap();
    assert_eq!(gallery.len(), 1);
}

// ============================================================================
// TEST 7: shutdown mid-job abandons it
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_job() {
    let Harness {
        commands,
        mut events,
        shutdown,
        task,
    } = spawn_studio(MemoryStore::new());

    generate(&commands, "never finished").await;
    assert!(matches!(events.recv().await, Some(StudioEvent::Started { .. })));
    tokio::time::sleep(Duration::from_millis(1000)).await;
    shutdown.send(()).unwrap();

    let gallery = task.await.unwrap();
    assert!(gallery.is_empty());
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, StudioEvent::Completed { .. }));
    }
}

// ============================================================================
// TEST 8: file-backed gallery survives a restart
// ============================================================================
#[tokio::test(start_paused = true)]
async fn test_file_store_persists_generation() {
    let dir = tempfile::tempdir().unwrap();
    let Harness {
        commands,
        mut events,
        shutdown: _shutdown,
        task,
    } = spawn_studio(FileStore::new(dir.path()));

    generate(&commands, "northern lights over a frozen lake").await;
    until_settled(&mut events).await;
    drop(commands);
    let gallery = task.await.unwrap();

    let reopened = GalleryStore::load(FileStore::new(dir.path()));
    assert_eq!(reopened.records(), gallery.records());
    assert_eq!(reopened.records()[0].prompt, "northern lights over a frozen lake");
}
