//! # Core Error Types
//!
//! Errors raised by the command barrier and the job scheduler.

use thiserror::Error;

use crate::ecs::EntityId;

/// Errors from recording or replaying deferred commands.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// A destroy request arrived for an entity that earlier requests in the
    /// same frame already target or reference.
    #[error("cannot destroy {entity}: other pending commands still reference it")]
    DestroyConflict {
        /// The entity whose destruction was requested.
        entity: EntityId,
    },

    /// A request targets or references an entity whose destruction is
    /// already pending in the same frame.
    #[error("command references {entity} after its destruction was requested")]
    UseAfterDestroy {
        /// The entity pending destruction.
        entity: EntityId,
    },
}

/// Result type for command recording and playback.
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors from the job scheduler.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
