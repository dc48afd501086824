//! Active session state
//!
//! [`SessionContext`] holds the single piece of mutable session identity the
//! whole workflow revolves around: the current session id, its stage, its
//! immutable video metadata, and a generation counter. Exactly one session is
//! active at a time; a new upload replaces the previous session wholesale.
//!
//! Only the orchestrator mutates this type. The generation counter lets async
//! continuations that captured an older session detect that they are stale and
//! discard their effect instead of corrupting a newer session.

use crate::error::{Error, Result};
use crate::types::{SessionId, Stage, VideoMetadata};

/// The identity and accumulated state of one upload-through-export workflow
#[derive(Debug, Default)]
pub struct SessionContext {
    id: Option<SessionId>,
    stage: Stage,
    metadata: Option<VideoMetadata>,
    generation: u64,
}

impl SessionContext {
    /// Create an empty context at stage `Idle`
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new active session at stage `Uploaded`
    ///
    /// Discards any prior session and bumps the generation counter. Returns
    /// the new generation so the caller can guard later continuations.
    pub fn set_active(&mut self, id: SessionId, metadata: Option<VideoMetadata>) -> u64 {
        self.id = Some(id);
        self.stage = Stage::Uploaded;
        self.metadata = metadata;
        self.generation += 1;
        self.generation
    }

    /// The active session id, if any
    pub fn current_id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    /// The current stage
    pub fn current_stage(&self) -> Stage {
        self.stage
    }

    /// Metadata of the active session's video, if reported at upload time
    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    /// Generation counter of the active session
    ///
    /// Incremented on every `set_active`. A continuation holding an older
    /// value must not mutate the context.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Advance the session to `target`
    ///
    /// Fails with [`Error::InvalidTransition`] unless the move is legal per
    /// [`Stage::can_advance_to`]. Advancing into `Errored` is always legal.
    pub fn advance(&mut self, target: Stage) -> Result<()> {
        if !self.stage.can_advance_to(target) {
            return Err(Error::InvalidTransition {
                from: self.stage,
                to: target,
            });
        }
        self.stage = target;
        Ok(())
    }

    /// Drop the active session and return to `Idle`
    ///
    /// Bumps the generation so in-flight continuations for the dropped
    /// session cannot apply.
    pub fn clear(&mut self) {
        self.id = None;
        self.stage = Stage::Idle;
        self.metadata = None;
        self.generation += 1;
    }
}
