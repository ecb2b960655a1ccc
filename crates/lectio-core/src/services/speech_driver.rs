//! Speech driver: correlates engine callbacks to logical chunks.
//!
//! The platform engine reports utterance lifecycle on its own execution
//! context, with no ordering or dedup guarantees. The driver translates that
//! stream into exactly two clean events per spoken chunk — progress and done
//! — keyed by `(item, chunk)`, and guarantees at most one `ChunkDone` per
//! utterance id no matter how the engine misbehaves.
//!
//! Cancellation works by invalidation, not by locking around the engine:
//! `stop()` bumps the generation counter and clears the correlation table, so
//! any callback that arrives later finds no entry and is a no-op.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::ports::SpeechEnginePort;

/// Pause between the engine reporting an utterance done and the `ChunkDone`
/// event, giving the engine time to go quiescent before the next `speak`.
pub const CHUNK_DONE_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Events emitted by the driver, consumed by the playback orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// The engine reached a character offset within the current chunk.
    ChunkProgress {
        utterance_id: String,
        item_id: i64,
        chunk_index: i32,
        /// Offset within the chunk, rebased past the slice the utterance
        /// started at. Never negative.
        absolute_offset_in_chunk: i32,
    },
    /// The engine finished the chunk. Emitted at most once per utterance.
    ChunkDone {
        utterance_id: String,
        item_id: i64,
        chunk_index: i32,
    },
    /// The engine failed mid-utterance.
    EngineError { utterance_id: String },
}

#[derive(Debug, Clone)]
struct UtteranceEntry {
    item_id: i64,
    chunk_index: i32,
    base_offset_chars: i32,
    generation: u64,
}

#[derive(Default)]
struct DriverState {
    /// Live utterances by id. Entries leave on completion, error, or stop.
    active: HashMap<String, UtteranceEntry>,
    /// Utterance ids whose terminal callback was already processed.
    handled: HashSet<String>,
}

/// Owns one speech engine instance and the callback correlation state.
pub struct SpeechDriver {
    engine: Arc<dyn SpeechEnginePort>,
    events: mpsc::UnboundedSender<SpeechEvent>,
    generation: AtomicU64,
    state: Mutex<DriverState>,
    settle_delay: Duration,
    runtime: tokio::runtime::Handle,
}

impl SpeechDriver {
    /// Create a driver around an engine instance.
    ///
    /// Must be called from within a tokio runtime; the captured handle is
    /// used to schedule the settle delay from engine callback contexts.
    pub fn new(engine: Arc<dyn SpeechEnginePort>, events: mpsc::UnboundedSender<SpeechEvent>) -> Self {
        Self {
            engine,
            events,
            generation: AtomicU64::new(0),
            state: Mutex::new(DriverState::default()),
            settle_delay: CHUNK_DONE_SETTLE_DELAY,
            runtime: tokio::runtime::Handle::current(),
        }
    }

    /// Override the settle delay (tests).
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Speak one chunk slice.
    ///
    /// `text` is already sliced to start at `base_offset_chars` within the
    /// chunk; range-start callbacks are rebased by that amount. Returns the
    /// utterance id, or `None` for blank text (nothing is sent to the
    /// engine).
    pub fn speak(
        &self,
        item_id: i64,
        chunk_index: i32,
        text: &str,
        base_offset_chars: i32,
    ) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let utterance_id = format!("lectio-item-{item_id}-chunk-{chunk_index}-gen-{generation}");
        {
            let mut state = self.state.lock().expect("driver state poisoned");
            // A reused id must be treated as fresh, not as already handled.
            state.handled.remove(&utterance_id);
            state.active.insert(
                utterance_id.clone(),
                UtteranceEntry {
                    item_id,
                    chunk_index,
                    base_offset_chars: base_offset_chars.max(0),
                    generation,
                },
            );
        }
        tracing::debug!(item_id, chunk_index, %utterance_id, "speaking chunk");
        self.engine.speak(text, &utterance_id);
        Some(utterance_id)
    }

    /// Engine callback: speech reached `start_offset` within the spoken text.
    pub fn on_range_start(&self, utterance_id: &str, start_offset: i32) {
        let entry = {
            let state = self.state.lock().expect("driver state poisoned");
            state.active.get(utterance_id).cloned()
        };
        let Some(entry) = entry else {
            // Stale or cancelled utterance; nothing to correlate.
            return;
        };
        let absolute = (entry.base_offset_chars + start_offset).max(0);
        let _ = self.events.send(SpeechEvent::ChunkProgress {
            utterance_id: utterance_id.to_string(),
            item_id: entry.item_id,
            chunk_index: entry.chunk_index,
            absolute_offset_in_chunk: absolute,
        });
    }

    /// Engine callback: the utterance finished.
    ///
    /// Duplicate completions for the same id are dropped by the idempotency
    /// set; the `ChunkDone` event is emitted once, after the settle delay.
    pub fn on_done(&self, utterance_id: &str) {
        let entry = {
            let mut state = self.state.lock().expect("driver state poisoned");
            if !state.active.contains_key(utterance_id) {
                // Already handled or stopped.
                return;
            }
            if !state.handled.insert(utterance_id.to_string()) {
                tracing::debug!(%utterance_id, "dropping duplicate completion callback");
                return;
            }
            state.active.remove(utterance_id)
        };
        let Some(entry) = entry else { return };

        tracing::debug!(
            %utterance_id,
            item_id = entry.item_id,
            chunk_index = entry.chunk_index,
            generation = entry.generation,
            "chunk finished"
        );
        let event = SpeechEvent::ChunkDone {
            utterance_id: utterance_id.to_string(),
            item_id: entry.item_id,
            chunk_index: entry.chunk_index,
        };
        let events = self.events.clone();
        let delay = self.settle_delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = events.send(event);
        });
    }

    /// Engine callback: the utterance failed.
    pub fn on_error(&self, utterance_id: &str) {
        {
            let mut state = self.state.lock().expect("driver state poisoned");
            state.active.remove(utterance_id);
            state.handled.insert(utterance_id.to_string());
        }
        tracing::warn!(%utterance_id, "speech engine reported an error");
        let _ = self.events.send(SpeechEvent::EngineError {
            utterance_id: utterance_id.to_string(),
        });
    }

    /// Stop speaking and invalidate every in-flight utterance.
    ///
    /// Synchronous from the caller's view: correlation state is cleared
    /// before the engine is told to stop, so a fast subsequent `speak()`
    /// cannot be confused with the utterance being stopped.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        {
            let mut state = self.state.lock().expect("driver state poisoned");
            state.active.clear();
            state.handled.clear();
        }
        self.engine.stop();
    }

    /// Stop and release the engine instance.
    pub fn shutdown(&self) {
        self.stop();
        self.engine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::timeout;

    #[derive(Default)]
    struct FakeEngine {
        spoken: Mutex<Vec<(String, String)>>,
        stops: AtomicUsize,
        shutdowns: AtomicUsize,
    }

    impl SpeechEnginePort for FakeEngine {
        fn speak(&self, text: &str, utterance_id: &str) {
            self.spoken
                .lock()
                .unwrap()
                .push((text.to_string(), utterance_id.to_string()));
        }

        fn stop(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn shutdown(&self) {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn driver() -> (Arc<FakeEngine>, SpeechDriver, UnboundedReceiver<SpeechEvent>) {
        let engine = Arc::new(FakeEngine::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let driver =
            SpeechDriver::new(engine.clone(), tx).with_settle_delay(Duration::from_millis(0));
        (engine, driver, rx)
    }

    async fn recv(rx: &mut UnboundedReceiver<SpeechEvent>) -> SpeechEvent {
        timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for driver event")
            .expect("driver event channel closed")
    }

    async fn assert_no_event(rx: &mut UnboundedReceiver<SpeechEvent>) {
        assert!(
            timeout(Duration::from_millis(50), rx.recv()).await.is_err(),
            "expected no further driver event"
        );
    }

    #[tokio::test]
    async fn test_speak_tags_utterance_and_reaches_engine() {
        let (engine, driver, _rx) = driver();
        let id = driver.speak(7, 2, "hello there", 0).unwrap();
        assert!(id.contains("item-7"));
        assert!(id.contains("chunk-2"));

        let spoken = engine.spoken.lock().unwrap();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].0, "hello there");
        assert_eq!(spoken[0].1, id);
    }

    #[tokio::test]
    async fn test_speak_ignores_blank_text() {
        let (engine, driver, _rx) = driver();
        assert!(driver.speak(7, 0, "   ", 0).is_none());
        assert!(engine.spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_speak_generates_fresh_utterance_ids() {
        let (_engine, driver, _rx) = driver();
        let first = driver.speak(7, 2, "text", 0).unwrap();
        let second = driver.speak(7, 2, "text", 0).unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_range_start_rebases_offset() {
        let (_engine, driver, mut rx) = driver();
        let id = driver.speak(7, 1, "liced text", 40).unwrap();

        driver.on_range_start(&id, 6);
        let event = recv(&mut rx).await;
        assert_eq!(
            event,
            SpeechEvent::ChunkProgress {
                utterance_id: id,
                item_id: 7,
                chunk_index: 1,
                absolute_offset_in_chunk: 46,
            }
        );
    }

    #[tokio::test]
    async fn test_range_start_for_unknown_utterance_is_dropped() {
        let (_engine, driver, mut rx) = driver();
        driver.on_range_start("lectio-item-9-chunk-0-gen-99", 5);
        assert_no_event(&mut rx).await;
    }

    #[tokio::test]
    async fn test_duplicate_done_emits_single_chunk_done() {
        let (_engine, driver, mut rx) = driver();
        let id = driver.speak(7, 3, "text", 0).unwrap();

        driver.on_done(&id);
        driver.on_done(&id);
        driver.on_done(&id);

        let event = recv(&mut rx).await;
        assert_eq!(
            event,
            SpeechEvent::ChunkDone {
                utterance_id: id,
                item_id: 7,
                chunk_index: 3,
            }
        );
        assert_no_event(&mut rx).await;
    }

    #[tokio::test]
    async fn test_callbacks_after_stop_are_noops() {
        let (engine, driver, mut rx) = driver();
        let id = driver.speak(7, 0, "text", 0).unwrap();

        driver.stop();
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);

        driver.on_range_start(&id, 3);
        driver.on_done(&id);
        assert_no_event(&mut rx).await;
    }

    #[tokio::test]
    async fn test_error_removes_correlation_and_surfaces_event() {
        let (_engine, driver, mut rx) = driver();
        let id = driver.speak(7, 0, "text", 0).unwrap();

        driver.on_error(&id);
        assert_eq!(
            recv(&mut rx).await,
            SpeechEvent::EngineError {
                utterance_id: id.clone()
            }
        );

        // The terminal error consumed the utterance; a late done is dropped.
        driver.on_done(&id);
        assert_no_event(&mut rx).await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_then_releases_engine() {
        let (engine, driver, _rx) = driver();
        driver.shutdown();
        assert_eq!(engine.stops.load(Ordering::SeqCst), 1);
        assert_eq!(engine.shutdowns.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_progress_from_previous_generation_is_ignored_after_replacement() {
        let (_engine, driver, mut rx) = driver();
        let first = driver.speak(7, 0, "first", 0).unwrap();
        driver.stop();
        let second = driver.speak(7, 0, "first again", 10).unwrap();

        driver.on_range_start(&first, 2);
        assert_no_event(&mut rx).await;

        driver.on_range_start(&second, 2);
        let event = recv(&mut rx).await;
        assert!(matches!(
            event,
            SpeechEvent::ChunkProgress {
                absolute_offset_in_chunk: 12,
                ..
            }
        ));
    }
}
