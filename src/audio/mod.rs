//! Audio for simulation sound events
//!
//! Every sound is synthesized from oscillators, one cue per `GameEvent`.
//! Playback itself is wasm only; the resume bookkeeping is plain Rust.

use std::cell::Cell;
use std::rc::Rc;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

/// Tracks whether an audio-context resume is still in flight
///
/// Clones share one flag, so the promise callbacks can clear it.
#[derive(Debug, Clone, Default)]
pub struct ResumeGate(Rc<Cell<bool>>);

impl ResumeGate {
    /// Claim the gate; false while an earlier resume is pending
    pub fn begin(&self) -> bool {
        !self.0.replace(true)
    }

    pub fn finish(&self) {
        self.0.set(false);
    }

    pub fn is_pending(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_resume_in_flight() {
        let gate = ResumeGate::default();
        assert!(gate.begin());
        assert!(gate.is_pending());
        // Repeated key presses while pending do not start another resume
        assert!(!gate.begin());
        assert!(!gate.begin());
    }

    #[test]
    fn test_settled_resume_allows_retry() {
        let gate = ResumeGate::default();
        let callback = gate.clone();
        assert!(gate.begin());
        callback.finish();
        assert!(!gate.is_pending());
        assert!(gate.begin());
    }
}
