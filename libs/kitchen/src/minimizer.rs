//! Background decay minimizer.
//!
//! The minimizer sweeps the topology worst shelf first, most decayed order
//! first, and tries to relocate each order to a strictly better shelf. All
//! relocation attempts for one shelf run concurrently and are joined before
//! the next shelf is visited: the fan-out spreads contention across order
//! locks while the join keeps shelves with nearby decay rates from
//! oscillating orders back and forth.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::kitchen::Kitchen;

/// Decay minimizer pacing.
#[derive(Debug, Clone)]
pub struct MinimizerConfig {
    /// Shortest pause between sweeps.
    pub min_pause: Duration,

    /// Longest pause between sweeps.
    pub max_pause: Duration,
}

impl Default for MinimizerConfig {
    fn default() -> Self {
        Self {
            min_pause: Duration::from_millis(500),
            max_pause: Duration::from_millis(1500),
        }
    }
}

/// Long-lived relocation loop over a shared kitchen.
pub struct DecayMinimizer {
    kitchen: Arc<Kitchen>,
    config: MinimizerConfig,
}

impl DecayMinimizer {
    pub fn new(kitchen: Arc<Kitchen>) -> Self {
        Self::with_config(kitchen, MinimizerConfig::default())
    }

    pub fn with_config(kitchen: Arc<Kitchen>, config: MinimizerConfig) -> Self {
        Self { kitchen, config }
    }

    /// Run sweeps until shutdown, pausing a jittered duration between
    /// iterations. Shutdown drains after the sweep in progress.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            min_pause_ms = self.config.min_pause.as_millis() as u64,
            max_pause_ms = self.config.max_pause.as_millis() as u64,
            "Starting decay minimizer"
        );

        loop {
            self.sweep().await;

            let pause = self.jittered_pause();
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Decay minimizer shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One full pass over the topology.
    pub async fn sweep(&self) {
        for shelf in self.kitchen.shelves_desc() {
            let snapshot = shelf.orders().await;
            if snapshot.is_empty() {
                continue;
            }

            let mut ranked = Vec::with_capacity(snapshot.len());
            for order in snapshot {
                let decayed = order.decayed().await;
                ranked.push((decayed, order));
            }
            ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

            debug!(
                shelf = shelf.name(),
                orders = ranked.len(),
                "sweeping shelf"
            );

            // Fork-join: all of this shelf's orders settle before the next
            // (less bad) shelf is considered.
            let mut tasks = Vec::with_capacity(ranked.len());
            for (_, order) in ranked {
                let kitchen = Arc::clone(&self.kitchen);
                tasks.push(tokio::spawn(async move {
                    kitchen
                        .optimize_placement(&order, kitchen.shelves_asc())
                        .await;
                }));
            }
            for task in tasks {
                if let Err(err) = task.await {
                    warn!(error = %err, "relocation task failed");
                }
            }
        }
    }

    fn jittered_pause(&self) -> Duration {
        let min = self.config.min_pause.as_secs_f64();
        let max = self.config.max_pause.as_secs_f64().max(min);
        Duration::from_secs_f64(rand::rng().random_range(min..=max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KitchenConfig;

    #[test]
    fn test_minimizer_config_default() {
        let config = MinimizerConfig::default();
        assert_eq!(config.min_pause, Duration::from_millis(500));
        assert_eq!(config.max_pause, Duration::from_millis(1500));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let yaml = r#"
kitchen:
  topology:
    - name: hot
      capacity: 1
      decay_rate: 1
      supported: [hot]
"#;
        let kitchen = Arc::new(Kitchen::new(&KitchenConfig::from_yaml(yaml).unwrap()).unwrap());
        let minimizer = DecayMinimizer::new(kitchen);

        for _ in 0..100 {
            let pause = minimizer.jittered_pause();
            assert!(pause >= Duration::from_millis(500));
            assert!(pause <= Duration::from_millis(1500));
        }
    }
}
