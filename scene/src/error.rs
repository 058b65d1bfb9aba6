use relay_shared::{Identifier, MarshalError};
use thiserror::Error;

/// Every failure a scene operation can report across the boundary.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Identifier resolution or registration failed.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error("a step is already in flight")]
    StepAlreadyInFlight,

    #[error("scene is busy stepping")]
    SceneBusy,

    #[error("no step in flight")]
    NoStepInFlight,

    #[error("cooking failed: {0}")]
    CookingFailed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("actor {0} has no shape {1}")]
    ShapeNotOnActor(Identifier, Identifier),

    #[error("invalid or destroyed scene handle")]
    InvalidHandle,

    #[error("failed to spawn step worker")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("step worker disconnected")]
    WorkerDisconnected,
}

impl SceneError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            SceneError::Marshal(MarshalError::UnresolvedIdentifier { .. })
        )
    }
}
