use gr_core::{ActorId, ItemId};

use crate::inventory::InventoryError;
use crate::persistence::StoreError;

/// Result alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Failures inside the tick loop. None of these abort a tick: the scheduler
/// logs them against the actor that raised them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A referenced actor no longer exists.
    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    /// A referenced ground item no longer exists.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// An intent carried values outside the accepted range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An actor tried to target itself.
    #[error("actor {0} cannot target itself")]
    SelfTarget(ActorId),

    /// An inventory operation failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),

    /// Loading a character failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),

    /// A species index has no content definition.
    #[error("unknown species index: {0}")]
    UnknownSpecies(u32),

    /// A session id joined twice.
    #[error("session already joined: {0}")]
    DuplicateSession(ActorId),

    /// The player cap is reached.
    #[error("server full ({0} players)")]
    ServerFull(usize),
}
