//! Error types for the scheduling core.

use thiserror::Error;
use uuid::Uuid;

use crate::order::OrderState;

/// Errors from shelf container operations.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// The shelf is full; the placement routine recovers from this by
    /// trying the next candidate.
    #[error("shelf {shelf} is at capacity {capacity}")]
    AtCapacity { shelf: String, capacity: usize },

    /// No order with this id on the shelf.
    #[error("order {id} not present on shelf {shelf}")]
    NotFound { id: Uuid, shelf: String },
}

/// Errors from order state transitions and shelf transfers.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The transition precondition did not hold.
    #[error("order {id} in state {actual}, expected {expected}")]
    WrongState {
        id: Uuid,
        actual: OrderState,
        expected: OrderState,
    },

    /// Attempted transition or transfer from PickedUp or Trashed.
    #[error("order {id} is in terminal state {state}")]
    Terminal { id: Uuid, state: OrderState },

    /// The order's value reached zero; it has been moved to Trashed and
    /// detached from its shelf before this error was returned.
    #[error("order {id} expired")]
    Expired { id: Uuid },

    #[error(transparent)]
    Shelf(#[from] ShelfError),
}

/// Errors from kitchen lifecycle operations.
#[derive(Debug, Error)]
pub enum KitchenError {
    /// No shelf in the topology supports the order's temperature. The order
    /// has been trashed.
    #[error("no shelf supports temperature {temp:?}")]
    Unsupported { temp: String },

    /// Every supporting shelf was at capacity. The order has been trashed.
    #[error("no shelf with free capacity for temperature {temp:?}")]
    NoShelf { temp: String },

    #[error(transparent)]
    Order(#[from] OrderError),
}

/// Errors from topology configuration ingestion.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("duplicate shelf name {0:?}")]
    DuplicateShelf(String),

    #[error("shelf {shelf:?}: unknown type {kind:?}")]
    UnknownShelfType { shelf: String, kind: String },

    #[error("shelf {shelf:?}: {reason}")]
    InvalidShelf { shelf: String, reason: String },
}
