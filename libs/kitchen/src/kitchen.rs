//! The kitchen scheduler.
//!
//! The kitchen owns the shelf topology (immutable after construction),
//! drives the order lifecycle, and places orders on the best supporting
//! shelf available. Two precomputed orderings of the shelves, ascending and
//! descending by decay rate, back the placement routine and the background
//! decay minimizer; a per-temperature index narrows placement to supporting
//! shelves without scanning the topology.
//!
//! Lock ordering: an order's lock is always acquired before any shelf lock
//! within a critical section, never the other way around.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::KitchenConfig;
use crate::error::{ConfigError, KitchenError};
use crate::order::{Order, OrderState};
use crate::shelf::{Shelf, StaticShelf};

/// The stateful dispatcher. One instance per process; collaborators share
/// it as `Arc<Kitchen>`.
pub struct Kitchen {
    /// Shelves from best (lowest) decay rate to worst.
    shelves_asc: Vec<Arc<dyn Shelf>>,

    /// Shelves from worst decay rate to best.
    shelves_desc: Vec<Arc<dyn Shelf>>,

    /// Temperature -> supporting shelves, each list sorted ascending by
    /// decay rate.
    supported_index: HashMap<String, Vec<Arc<dyn Shelf>>>,

    clock: Arc<dyn Clock>,
}

impl Kitchen {
    /// Build a kitchen from a validated topology, using the system clock.
    pub fn new(config: &KitchenConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a kitchen reading time from the given clock. Orders created
    /// through [`Kitchen::new_order`] share it.
    pub fn with_clock(
        config: &KitchenConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut shelves_asc: Vec<Arc<dyn Shelf>> = config
            .topology
            .iter()
            .map(|shelf| Arc::new(StaticShelf::from_config(shelf)) as Arc<dyn Shelf>)
            .collect();
        shelves_asc.sort_by(|a, b| a.decay_rate().total_cmp(&b.decay_rate()));

        let mut shelves_desc = shelves_asc.clone();
        shelves_desc.reverse();

        // Walking the ascending list keeps every index entry sorted.
        let mut supported_index: HashMap<String, Vec<Arc<dyn Shelf>>> = HashMap::new();
        for shelf in &shelves_asc {
            for temp in shelf.supported() {
                supported_index
                    .entry(temp.clone())
                    .or_default()
                    .push(Arc::clone(shelf));
            }
        }

        Ok(Self {
            shelves_asc,
            shelves_desc,
            supported_index,
            clock,
        })
    }

    /// Create a new order (state ⊥) sharing the kitchen's clock.
    pub fn new_order(
        &self,
        name: impl Into<String>,
        temp: impl Into<String>,
        shelf_life: Duration,
        base_decay_rate: f64,
    ) -> Arc<Order> {
        Order::with_clock(
            name,
            temp,
            shelf_life,
            base_decay_rate,
            Arc::clone(&self.clock),
        )
    }

    /// Shelves sorted ascending by decay rate (best first).
    pub fn shelves_asc(&self) -> &[Arc<dyn Shelf>] {
        &self.shelves_asc
    }

    /// Shelves sorted descending by decay rate (worst first).
    pub fn shelves_desc(&self) -> &[Arc<dyn Shelf>] {
        &self.shelves_desc
    }

    /// Accept a new order and immediately make it ready for pickup (cook
    /// time is zero). Only the readiness outcome is surfaced; a redundant
    /// create falls through to `set_order_ready`'s own guards.
    pub async fn create_order(&self, order: &Arc<Order>) -> Result<(), KitchenError> {
        if let Err(err) = order
            .transition(OrderState::New, OrderState::Created)
            .await
        {
            debug!(order_id = %order.id(), error = %err, "order already created");
        }
        self.set_order_ready(order).await
    }

    /// Place a created order on the best supporting shelf and mark it
    /// Ready. Orders that match no shelf or find every supporting shelf at
    /// capacity are trashed before the error returns.
    pub async fn set_order_ready(&self, order: &Arc<Order>) -> Result<(), KitchenError> {
        let temp = order.temp();
        let Some(candidates) = self.supported_index.get(temp) else {
            warn!(order_id = %order.id(), temp, "no shelf supports this temperature, trashing order");
            self.trash_created(order).await;
            return Err(KitchenError::Unsupported {
                temp: temp.to_string(),
            });
        };

        if self.optimize_placement(order, candidates).await {
            order
                .transition(OrderState::Created, OrderState::Ready)
                .await?;
            return Ok(());
        }

        warn!(order_id = %order.id(), temp, "all supporting shelves at capacity, trashing order");
        self.trash_created(order).await;
        Err(KitchenError::NoShelf {
            temp: temp.to_string(),
        })
    }

    /// Trash an order that never made it to Ready. Guarded on the Created
    /// state so a failed re-placement cannot discard an order that is
    /// already live on a shelf.
    async fn trash_created(&self, order: &Arc<Order>) {
        if let Err(err) = order
            .transition(OrderState::Created, OrderState::Trashed)
            .await
        {
            debug!(order_id = %order.id(), error = %err, "order not trashed");
        }
    }

    /// Mark a ready order as out for delivery.
    pub async fn set_order_enroute(&self, order: &Arc<Order>) -> Result<(), KitchenError> {
        order
            .transition(OrderState::Ready, OrderState::Enroute)
            .await?;
        Ok(())
    }

    /// Mark an enroute order as picked up, detaching it from its shelf.
    pub async fn set_order_picked_up(&self, order: &Arc<Order>) -> Result<(), KitchenError> {
        order
            .transition(OrderState::Enroute, OrderState::PickedUp)
            .await?;
        Ok(())
    }

    /// Look up an order across all shelves.
    ///
    /// Scatter-gather: one task per shelf reports into a channel sized to
    /// the shelf count, so every send completes even after this method has
    /// returned with the first hit.
    pub async fn get_order(&self, id: Uuid) -> Option<Arc<Order>> {
        let (tx, mut rx) = mpsc::channel(self.shelves_asc.len().max(1));
        for shelf in &self.shelves_asc {
            let shelf = Arc::clone(shelf);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(shelf.get(id).await.ok()).await;
            });
        }
        drop(tx);

        while let Some(result) = rx.recv().await {
            if result.is_some() {
                return result;
            }
        }
        None
    }

    /// Point-in-time snapshot of every shelved order. An order caught
    /// mid-transfer (present on both shelves for an instant) appears once.
    pub async fn get_orders(&self) -> Vec<Arc<Order>> {
        let mut by_id: HashMap<Uuid, Arc<Order>> = HashMap::new();
        for shelf in &self.shelves_asc {
            for order in shelf.orders().await {
                by_id.entry(order.id()).or_insert(order);
            }
        }
        by_id.into_values().collect()
    }

    /// Try to move an order onto a strictly better shelf from `candidates`
    /// (expected sorted ascending by decay rate). Returns whether the order
    /// moved. An expired order is trashed instead.
    ///
    /// Capacity rejections are recovered locally by trying the next
    /// candidate; unsupported temperatures, the current shelf and shelves
    /// with an equal-or-worse decay rate are skipped outright.
    pub async fn optimize_placement(
        &self,
        order: &Arc<Order>,
        candidates: &[Arc<dyn Shelf>],
    ) -> bool {
        if order.is_expired().await {
            debug!(order_id = %order.id(), "order expired, trashing");
            order.trash().await;
            return false;
        }

        let current = order.shelf().await;
        let temp = order.temp();

        for shelf in candidates {
            if !shelf.supports(temp) {
                continue;
            }
            if let Some(current) = &current {
                if Arc::ptr_eq(current, shelf) {
                    continue;
                }
                if current.decay_rate() <= shelf.decay_rate() {
                    continue;
                }
            }
            match Arc::clone(order).set_shelf(Arc::clone(shelf)).await {
                Ok(()) => {
                    debug!(order_id = %order.id(), shelf = shelf.name(), "order placed");
                    return true;
                }
                Err(err) => {
                    debug!(order_id = %order.id(), shelf = shelf.name(), error = %err, "candidate shelf rejected order");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: 1
      supported:
        - hot
    - name: cold
      capacity: 1
      decay_rate: 0.5
      supported:
        - cold
"#;

    fn kitchen(yaml: &str) -> Kitchen {
        let config = KitchenConfig::from_yaml(yaml).unwrap();
        Kitchen::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_constructor_precomputes_orderings() {
        let kitchen = kitchen(SIMPLE);

        assert_eq!(kitchen.shelves_asc().len(), 2);
        assert_eq!(kitchen.shelves_desc().len(), 2);

        assert_eq!(kitchen.shelves_asc()[0].name(), "cold");
        assert_eq!(kitchen.shelves_asc()[0].capacity(), 1);
        assert_eq!(kitchen.shelves_asc()[0].decay_rate(), 0.5);
        assert_eq!(kitchen.shelves_asc()[1].name(), "hot");
        assert_eq!(kitchen.shelves_asc()[1].decay_rate(), 1.0);

        assert_eq!(kitchen.shelves_desc()[0].name(), "hot");
        assert_eq!(kitchen.shelves_desc()[1].name(), "cold");

        let hot_index = kitchen.supported_index.get("hot").unwrap();
        assert_eq!(hot_index.len(), 1);
        assert_eq!(hot_index[0].name(), "hot");
        let cold_index = kitchen.supported_index.get("cold").unwrap();
        assert_eq!(cold_index.len(), 1);
        assert_eq!(cold_index[0].name(), "cold");
    }

    #[tokio::test]
    async fn test_index_lists_are_sorted_ascending() {
        let yaml = r#"
kitchen:
  topology:
    - name: overflow
      capacity: 10
      decay_rate: 2
      supported: [hot, cold]
    - name: hot
      capacity: 10
      decay_rate: 1
      supported: [hot]
    - name: chill
      capacity: 10
      decay_rate: 0.1
      supported: [hot, cold]
"#;
        let kitchen = kitchen(yaml);
        let hot_index = kitchen.supported_index.get("hot").unwrap();
        let rates: Vec<f64> = hot_index.iter().map(|s| s.decay_rate()).collect();
        assert_eq!(rates, vec![0.1, 1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_create_order_places_and_readies() {
        let kitchen = kitchen(SIMPLE);
        let order = kitchen.new_order("soup", "hot", Duration::from_secs(100), 0.2);

        kitchen.create_order(&order).await.unwrap();

        assert_eq!(order.state().await, OrderState::Ready);
        let shelf = order.shelf().await.unwrap();
        assert_eq!(shelf.name(), "hot");
        assert!(order.created_at().await.is_some());
        assert!(order.ready_at().await.is_some());
    }

    #[tokio::test]
    async fn test_create_order_twice_surfaces_readiness_outcome() {
        let kitchen = kitchen(SIMPLE);
        let order = kitchen.new_order("soup", "hot", Duration::from_secs(100), 0.2);

        kitchen.create_order(&order).await.unwrap();

        // the duplicate create reports only the readiness outcome: the order
        // already sits on the sole supporting shelf, so no placement is
        // possible, and the live order is left untouched
        let err = kitchen.create_order(&order).await.unwrap_err();
        assert!(matches!(err, KitchenError::NoShelf { .. }));
        assert_eq!(order.state().await, OrderState::Ready);
        assert_eq!(order.shelf().await.unwrap().name(), "hot");
        assert_eq!(kitchen.get_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn test_get_order_finds_across_shelves() {
        let kitchen = kitchen(SIMPLE);
        let hot = kitchen.new_order("soup", "hot", Duration::from_secs(100), 0.2);
        let cold = kitchen.new_order("icecream", "cold", Duration::from_secs(100), 0.2);
        kitchen.create_order(&hot).await.unwrap();
        kitchen.create_order(&cold).await.unwrap();

        let found = kitchen.get_order(cold.id()).await.unwrap();
        assert_eq!(found.id(), cold.id());
        assert!(kitchen.get_order(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_get_orders_excludes_detached() {
        let kitchen = kitchen(SIMPLE);
        let hot = kitchen.new_order("soup", "hot", Duration::from_secs(100), 0.2);
        let cold = kitchen.new_order("icecream", "cold", Duration::from_secs(100), 0.2);
        kitchen.create_order(&hot).await.unwrap();
        kitchen.create_order(&cold).await.unwrap();
        assert_eq!(kitchen.get_orders().await.len(), 2);

        kitchen.set_order_enroute(&hot).await.unwrap();
        kitchen.set_order_picked_up(&hot).await.unwrap();

        let listed = kitchen.get_orders().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id(), cold.id());
    }
}
