//! Order value object and lifecycle state machine.
//!
//! An order moves along exactly one of two paths:
//!
//! ```text
//! New -> Created -> Ready -> Enroute -> PickedUp
//!              \        \         \
//!               +--------+---------+--> Trashed
//! ```
//!
//! PickedUp and Trashed are absorbing. The mutable half of an order lives
//! behind a single `RwLock`; the identity and menu fields never change and
//! are readable without it. All value arithmetic is in f64 seconds.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::OrderError;
use crate::shelf::Shelf;

/// Order lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderState {
    /// Not yet accepted by the kitchen.
    New,
    Created,
    Ready,
    Enroute,
    PickedUp,
    Trashed,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Created => "created",
            Self::Ready => "ready",
            Self::Enroute => "enroute",
            Self::PickedUp => "pickedup",
            Self::Trashed => "trashed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "created" => Some(Self::Created),
            "ready" => Some(Self::Ready),
            "enroute" => Some(Self::Enroute),
            "pickedup" => Some(Self::PickedUp),
            "trashed" => Some(Self::Trashed),
            _ => None,
        }
    }

    /// PickedUp and Trashed admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::PickedUp | Self::Trashed)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-protected mutable half of an order.
struct OrderCell {
    state: OrderState,
    created_at: Option<DateTime<Utc>>,
    ready_at: Option<DateTime<Utc>>,
    enroute_at: Option<DateTime<Utc>>,
    picked_up_at: Option<DateTime<Utc>>,
    trashed_at: Option<DateTime<Utc>>,

    /// Non-owning handle to the containing shelf; the kitchen owns shelves.
    shelf: Option<Weak<dyn Shelf>>,
    placed_at: Option<DateTime<Utc>>,

    /// Decay accumulated on shelves the order has already left, in seconds.
    /// Non-decreasing over the order's lifetime.
    prev_decayed: f64,
}

/// An incoming customer order.
///
/// Orders are shared between the kitchen, shelves and the background
/// optimizer, so constructors hand back an `Arc` directly.
pub struct Order {
    id: Uuid,
    name: String,
    temp: String,
    shelf_life: Duration,
    base_decay_rate: f64,
    clock: Arc<dyn Clock>,
    cell: RwLock<OrderCell>,
}

/// Consistent view of an order's state and derived values, taken under a
/// single read lock. Durations are in seconds.
#[derive(Debug, Clone)]
pub struct OrderSnapshot {
    pub id: Uuid,
    pub name: String,
    pub temp: String,
    pub state: OrderState,
    pub shelf: Option<String>,
    pub shelf_life: f64,
    pub age: f64,
    pub value: f64,
    pub normalized_value: f64,
    pub decayed: f64,
}

impl Order {
    /// Create an order with the system clock.
    pub fn new(
        name: impl Into<String>,
        temp: impl Into<String>,
        shelf_life: Duration,
        base_decay_rate: f64,
    ) -> Arc<Self> {
        Self::with_clock(name, temp, shelf_life, base_decay_rate, Arc::new(SystemClock))
    }

    /// Create an order reading time from the given clock.
    pub fn with_clock(
        name: impl Into<String>,
        temp: impl Into<String>,
        shelf_life: Duration,
        base_decay_rate: f64,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: Uuid::new_v4(),
            name: name.into(),
            temp: temp.into(),
            shelf_life,
            base_decay_rate,
            clock,
            cell: RwLock::new(OrderCell {
                state: OrderState::New,
                created_at: None,
                ready_at: None,
                enroute_at: None,
                picked_up_at: None,
                trashed_at: None,
                shelf: None,
                placed_at: None,
                prev_decayed: 0.0,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Temperature category, matched against shelf capability sets.
    pub fn temp(&self) -> &str {
        &self.temp
    }

    pub fn shelf_life(&self) -> Duration {
        self.shelf_life
    }

    pub fn base_decay_rate(&self) -> f64 {
        self.base_decay_rate
    }

    pub async fn state(&self) -> OrderState {
        self.cell.read().await.state
    }

    /// The shelf currently holding this order, if any.
    pub async fn shelf(&self) -> Option<Arc<dyn Shelf>> {
        self.cell.read().await.shelf.as_ref().and_then(Weak::upgrade)
    }

    pub async fn created_at(&self) -> Option<DateTime<Utc>> {
        self.cell.read().await.created_at
    }

    pub async fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.cell.read().await.ready_at
    }

    pub async fn enroute_at(&self) -> Option<DateTime<Utc>> {
        self.cell.read().await.enroute_at
    }

    pub async fn picked_up_at(&self) -> Option<DateTime<Utc>> {
        self.cell.read().await.picked_up_at
    }

    pub async fn trashed_at(&self) -> Option<DateTime<Utc>> {
        self.cell.read().await.trashed_at
    }

    /// Decay accumulated on already-departed shelves, in seconds.
    pub async fn prev_decayed(&self) -> f64 {
        self.cell.read().await.prev_decayed
    }

    /// Seconds since the order entered Ready; frozen at pickup, zero when
    /// trashed or not yet ready.
    pub async fn age(&self) -> f64 {
        let cell = self.cell.read().await;
        self.age_in(&cell, self.clock.now())
    }

    /// Remaining shelf life before decay is considered, in seconds.
    pub async fn raw_value(&self) -> f64 {
        let cell = self.cell.read().await;
        self.raw_value_in(&cell, self.clock.now())
    }

    /// Total decay accumulated so far, in seconds.
    pub async fn decayed(&self) -> f64 {
        let cell = self.cell.read().await;
        self.decayed_in(&cell, self.clock.now())
    }

    /// Remaining value: raw value minus accumulated decay, in seconds.
    pub async fn value(&self) -> f64 {
        let cell = self.cell.read().await;
        self.value_in(&cell, self.clock.now())
    }

    /// Value over shelf life; a score in (-inf, 1].
    pub async fn normalized_value(&self) -> f64 {
        let cell = self.cell.read().await;
        self.value_in(&cell, self.clock.now()) / self.shelf_life.as_secs_f64()
    }

    /// Whether the order's value has run out while waiting for pickup.
    pub async fn is_expired(&self) -> bool {
        let cell = self.cell.read().await;
        self.is_expired_in(&cell, self.clock.now())
    }

    /// Take a consistent snapshot of the order under one read lock.
    pub async fn snapshot(&self) -> OrderSnapshot {
        let cell = self.cell.read().await;
        let now = self.clock.now();
        let shelf_life = self.shelf_life.as_secs_f64();
        let value = self.value_in(&cell, now);
        OrderSnapshot {
            id: self.id,
            name: self.name.clone(),
            temp: self.temp.clone(),
            state: cell.state,
            shelf: cell
                .shelf
                .as_ref()
                .and_then(Weak::upgrade)
                .map(|shelf| shelf.name().to_string()),
            shelf_life,
            age: self.age_in(&cell, now),
            value,
            normalized_value: value / shelf_life,
            decayed: self.decayed_in(&cell, now),
        }
    }

    /// Move the order from `expected` to `next`.
    ///
    /// Atomic under the order's write lock. Fails with `WrongState` when the
    /// current state is not `expected` and with `Terminal` when the order is
    /// already picked up or trashed. Expiry is re-evaluated here: an expired
    /// order is forced to Trashed and detached from its shelf, and the call
    /// returns `Expired` instead of performing the requested transition.
    pub async fn transition(&self, expected: OrderState, next: OrderState) -> Result<(), OrderError> {
        let mut cell = self.cell.write().await;
        if cell.state != expected {
            return Err(OrderError::WrongState {
                id: self.id,
                actual: cell.state,
                expected,
            });
        }
        if cell.state.is_terminal() {
            return Err(OrderError::Terminal {
                id: self.id,
                state: cell.state,
            });
        }

        let now = self.clock.now();
        if self.is_expired_in(&cell, now) {
            cell.state = OrderState::Trashed;
            cell.trashed_at = Some(now);
            self.release_shelf(&mut cell, now).await;
            return Err(OrderError::Expired { id: self.id });
        }

        cell.state = next;
        match next {
            OrderState::Created => cell.created_at = Some(now),
            OrderState::Ready => cell.ready_at = Some(now),
            OrderState::Enroute => cell.enroute_at = Some(now),
            OrderState::PickedUp => {
                cell.picked_up_at = Some(now);
                self.release_shelf(&mut cell, now).await;
            }
            OrderState::Trashed => {
                cell.trashed_at = Some(now);
                self.release_shelf(&mut cell, now).await;
            }
            // No transition re-enters New.
            OrderState::New => {}
        }
        Ok(())
    }

    /// Move the order onto `target`, crediting decay earned on the shelf it
    /// leaves.
    ///
    /// The put on the destination happens before the removal from the source
    /// so that a concurrent lookup observes the order on one shelf or the
    /// other, never on neither. Capacity rejections from the destination
    /// propagate without mutating the order.
    pub async fn set_shelf(self: Arc<Self>, target: Arc<dyn Shelf>) -> Result<(), OrderError> {
        let mut cell = self.cell.write().await;
        if cell.state.is_terminal() {
            return Err(OrderError::Terminal {
                id: self.id,
                state: cell.state,
            });
        }
        if let Some(current) = cell.shelf.as_ref().and_then(Weak::upgrade) {
            if Arc::ptr_eq(&current, &target) {
                return Ok(());
            }
        }

        target.put(Arc::clone(&self)).await?;

        let now = self.clock.now();
        self.release_shelf(&mut cell, now).await;
        cell.shelf = Some(Arc::downgrade(&target));
        cell.placed_at = Some(now);
        Ok(())
    }

    /// Force the order to Trashed, detaching it from any shelf. No-op when
    /// the order is already terminal.
    pub(crate) async fn trash(&self) {
        let mut cell = self.cell.write().await;
        if cell.state.is_terminal() {
            return;
        }
        let now = self.clock.now();
        cell.state = OrderState::Trashed;
        cell.trashed_at = Some(now);
        self.release_shelf(&mut cell, now).await;
    }

    /// Leave the current shelf: credit the decay earned there into
    /// `prev_decayed` and remove the membership entry. Must be called with
    /// the order's write lock held; absence on the shelf is tolerated.
    async fn release_shelf(&self, cell: &mut OrderCell, now: DateTime<Utc>) {
        let Some(weak) = cell.shelf.take() else {
            return;
        };
        if let Some(shelf) = weak.upgrade() {
            if let Some(placed_at) = cell.placed_at {
                cell.prev_decayed += shelf.decay_rate() * secs_between(placed_at, now);
            }
            if let Err(err) = shelf.remove(self.id).await {
                debug!(order_id = %self.id, error = %err, "order already absent from shelf");
            }
        }
        cell.placed_at = None;
    }

    fn age_in(&self, cell: &OrderCell, now: DateTime<Utc>) -> f64 {
        match cell.state {
            OrderState::Ready | OrderState::Enroute => cell
                .ready_at
                .map(|ready_at| secs_between(ready_at, now))
                .unwrap_or(0.0),
            OrderState::PickedUp => match (cell.ready_at, cell.picked_up_at) {
                (Some(ready_at), Some(picked_up_at)) => secs_between(ready_at, picked_up_at),
                _ => 0.0,
            },
            _ => 0.0,
        }
    }

    fn raw_value_in(&self, cell: &OrderCell, now: DateTime<Utc>) -> f64 {
        match cell.state {
            OrderState::Ready | OrderState::Enroute | OrderState::PickedUp => {
                self.shelf_life.as_secs_f64() - self.age_in(cell, now)
            }
            _ => 0.0,
        }
    }

    fn decayed_in(&self, cell: &OrderCell, now: DateTime<Utc>) -> f64 {
        let mut decay = 0.0;
        if let Some(shelf) = cell.shelf.as_ref().and_then(Weak::upgrade) {
            if let Some(placed_at) = cell.placed_at {
                let until = match cell.state {
                    OrderState::PickedUp => cell.picked_up_at.unwrap_or(now),
                    _ => now,
                };
                decay += shelf.decay_rate() * secs_between(placed_at, until);
            }
        }
        decay += self.base_decay_rate * self.age_in(cell, now);
        cell.prev_decayed + decay
    }

    fn value_in(&self, cell: &OrderCell, now: DateTime<Utc>) -> f64 {
        self.raw_value_in(cell, now) - self.decayed_in(cell, now)
    }

    fn is_expired_in(&self, cell: &OrderCell, now: DateTime<Utc>) -> bool {
        matches!(cell.state, OrderState::Ready | OrderState::Enroute)
            && self.value_in(cell, now) <= 0.0
    }
}

fn secs_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0
}
