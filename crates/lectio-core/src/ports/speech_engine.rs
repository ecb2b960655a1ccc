//! Speech engine port — the thin surface the platform engine must provide.
//!
//! The engine speaks tagged utterances and reports lifecycle through
//! callbacks it delivers on its own execution context; the adapter forwards
//! those callbacks into the `SpeechDriver` (`on_range_start`, `on_done`,
//! `on_error`). The driver assumes no callback ordering and tolerates
//! duplicate terminal callbacks.

/// Port trait for a platform speech-synthesis engine.
pub trait SpeechEnginePort: Send + Sync {
    /// Start speaking `text`, replacing anything currently spoken.
    /// Subsequent callbacks for this request carry `utterance_id`.
    fn speak(&self, text: &str, utterance_id: &str);

    /// Stop speaking. The engine may still deliver callbacks for the
    /// interrupted utterance afterwards; the driver ignores them.
    fn stop(&self);

    /// Release the engine instance. No callbacks are expected after this.
    fn shutdown(&self);
}
