//! Shelf containers.
//!
//! A shelf is a capacity-bounded, thread-safe container of orders with a
//! fixed decay rate and a fixed set of supported temperatures. Shelves do
//! not enforce temperature matching; that filter belongs to the placement
//! routine.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::ShelfConfig;
use crate::error::ShelfError;
use crate::order::Order;

/// A container of orders. Implementations must be safe to share across
/// tasks; the kitchen holds them as `Arc<dyn Shelf>` and orders keep weak
/// back-references.
#[async_trait]
pub trait Shelf: Send + Sync {
    /// Unique label within the topology.
    fn name(&self) -> &str;

    /// Maximum concurrent order count.
    fn capacity(&self) -> usize;

    /// Temperature categories this shelf accepts.
    fn supported(&self) -> &[String];

    /// Decay contribution per second while an order sits here.
    fn decay_rate(&self) -> f64;

    fn supports(&self, temp: &str) -> bool {
        self.supported().iter().any(|t| t == temp)
    }

    /// Place an order. Idempotent when the order is already present; fails
    /// with `AtCapacity` when the shelf is full.
    async fn put(&self, order: Arc<Order>) -> Result<(), ShelfError>;

    /// Look up an order by id.
    async fn get(&self, id: Uuid) -> Result<Arc<Order>, ShelfError>;

    /// Remove an order by id.
    async fn remove(&self, id: Uuid) -> Result<(), ShelfError>;

    /// Unordered snapshot of the current orders.
    async fn orders(&self) -> Vec<Arc<Order>>;
}

/// The baseline shelf variant: fixed capacity, decay rate and supported
/// temperature set, all from configuration.
pub struct StaticShelf {
    name: String,
    capacity: usize,
    supported: Vec<String>,
    decay_rate: f64,
    orders: RwLock<HashMap<Uuid, Arc<Order>>>,
}

impl StaticShelf {
    pub fn new(
        name: impl Into<String>,
        capacity: usize,
        supported: Vec<String>,
        decay_rate: f64,
    ) -> Self {
        Self {
            name: name.into(),
            capacity,
            supported,
            decay_rate,
            orders: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    pub fn from_config(config: &ShelfConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.capacity,
            config.supported.clone(),
            config.decay_rate,
        )
    }
}

#[async_trait]
impl Shelf for StaticShelf {
    fn name(&self) -> &str {
        &self.name
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn supported(&self) -> &[String] {
        &self.supported
    }

    fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    async fn put(&self, order: Arc<Order>) -> Result<(), ShelfError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id()) {
            return Ok(());
        }
        if orders.len() >= self.capacity {
            return Err(ShelfError::AtCapacity {
                shelf: self.name.clone(),
                capacity: self.capacity,
            });
        }
        orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Arc<Order>, ShelfError> {
        let orders = self.orders.read().await;
        orders.get(&id).cloned().ok_or_else(|| ShelfError::NotFound {
            id,
            shelf: self.name.clone(),
        })
    }

    async fn remove(&self, id: Uuid) -> Result<(), ShelfError> {
        let mut orders = self.orders.write().await;
        match orders.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ShelfError::NotFound {
                id,
                shelf: self.name.clone(),
            }),
        }
    }

    async fn orders(&self) -> Vec<Arc<Order>> {
        let orders = self.orders.read().await;
        orders.values().cloned().collect()
    }
}
