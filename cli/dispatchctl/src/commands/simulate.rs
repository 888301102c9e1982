//! Synthetic load generation.
//!
//! Orders arrive on a Poisson process: inter-arrival gaps are drawn from an
//! exponential distribution at the configured rate. Each synthetic order is
//! driven ready -> enroute -> pickedup with a bounded random dispatch delay,
//! the way couriers trickle in against a live kitchen.

use std::time::Duration;

use anyhow::Result;
use clap::Args;
use rand::Rng;

use crate::client::{ApiClient, CreateOrderRequest};
use crate::commands::CommandContext;
use crate::error::CliError;
use crate::output::print_output;

/// Menu of synthetic orders: name, temperature, shelf life (s), decay rate.
const MENU: &[(&str, &str, f64, f64)] = &[
    ("icecream", "cold", 25.0, 1.0),
    ("soup", "hot", 50.0, 1.0),
    ("pizza", "frozen", 100.0, 1.0),
];

#[derive(Debug, Args)]
pub struct SimulateCommand {
    /// Number of orders to submit.
    #[arg(long, default_value_t = 20)]
    count: usize,

    /// Mean arrival rate, in orders per second.
    #[arg(long, default_value_t = 2.0)]
    rate: f64,

    /// Longest courier dispatch delay, in seconds.
    #[arg(long, default_value_t = 10)]
    max_delay: u64,
}

impl SimulateCommand {
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        anyhow::ensure!(self.rate > 0.0 && self.rate.is_finite(), "rate must be positive");
        anyhow::ensure!(self.count > 0, "count must be positive");

        println!(
            "simulating {} orders at ~{:.1}/s (max dispatch delay {}s)",
            self.count, self.rate, self.max_delay
        );

        // Periodic view of what is currently shelved.
        let status_client = ctx.client.clone();
        let status = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(2));
            loop {
                interval.tick().await;
                if let Ok(list) = status_client.list_orders().await {
                    println!("shelved: {}", list.orders.len());
                }
            }
        });

        let mut couriers = Vec::with_capacity(self.count);
        for _ in 0..self.count {
            tokio::time::sleep(exponential_gap(self.rate)).await;

            let client = ctx.client.clone();
            let max_delay = self.max_delay;
            couriers.push(tokio::spawn(async move {
                simulate_order(client, max_delay).await
            }));
        }

        let mut delivered = 0usize;
        let mut lost = 0usize;
        for courier in couriers {
            match courier.await {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(_)) | Err(_) => lost += 1,
            }
        }
        status.abort();

        println!();
        println!("delivered: {delivered}  lost: {lost}");

        let remaining = ctx.client.list_orders().await?;
        print_output(&remaining.orders, ctx.format);
        Ok(())
    }
}

/// Drive one synthetic order through its lifecycle. Any rejection along the
/// way (trashed on arrival, expired before pickup) counts as a lost order.
async fn simulate_order(client: ApiClient, max_delay: u64) -> Result<(), CliError> {
    let (name, temp, shelf_life, decay_rate) = pick_menu_item();
    let created = client
        .create_order(&CreateOrderRequest {
            name: name.to_string(),
            temp: temp.to_string(),
            shelf_life,
            decay_rate,
        })
        .await?;

    client.update_order(&created.order_id, "enroute").await?;

    let delay = rand::rng().random_range(0..=max_delay);
    tokio::time::sleep(Duration::from_secs(delay)).await;

    client.update_order(&created.order_id, "pickedup").await?;
    Ok(())
}

fn pick_menu_item() -> (&'static str, &'static str, f64, f64) {
    MENU[rand::rng().random_range(0..MENU.len())]
}

/// Sample an exponential inter-arrival gap for the given rate.
fn exponential_gap(rate: f64) -> Duration {
    let u: f64 = rand::rng().random_range(0.0..1.0);
    Duration::from_secs_f64(-(1.0 - u).ln() / rate)
}
