//! Order management commands.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::client::CreateOrderRequest;
use crate::commands::CommandContext;
use crate::output::{print_output, print_single, print_success};

#[derive(Debug, Args)]
pub struct OrderCommand {
    #[command(subcommand)]
    command: OrderSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrderSubcommand {
    /// Create a new order and place it on a shelf.
    Create {
        /// Menu item name.
        name: String,

        /// Temperature category (matched against shelf capabilities).
        #[arg(long)]
        temp: String,

        /// Shelf life in seconds.
        #[arg(long, default_value_t = 60.0)]
        shelf_life: f64,

        /// Intrinsic decay rate per second.
        #[arg(long, default_value_t = 0.5)]
        decay_rate: f64,
    },

    /// Fetch one order.
    Get {
        /// Order id.
        id: String,
    },

    /// List every shelved order.
    List,

    /// Advance an order to the given state (ready, enroute, pickedup).
    Advance {
        /// Order id.
        id: String,

        /// Target state.
        state: String,
    },
}

impl OrderCommand {
    pub async fn run(self, ctx: &CommandContext) -> Result<()> {
        match self.command {
            OrderSubcommand::Create {
                name,
                temp,
                shelf_life,
                decay_rate,
            } => {
                let created = ctx
                    .client
                    .create_order(&CreateOrderRequest {
                        name,
                        temp,
                        shelf_life,
                        decay_rate,
                    })
                    .await?;
                print_success(&format!("order {} created", created.order_id));
                Ok(())
            }
            OrderSubcommand::Get { id } => {
                let order = ctx.client.get_order(&id).await?;
                print_single(&order, ctx.format);
                Ok(())
            }
            OrderSubcommand::List => {
                let list = ctx.client.list_orders().await?;
                print_output(&list.orders, ctx.format);
                Ok(())
            }
            OrderSubcommand::Advance { id, state } => {
                let order = ctx.client.update_order(&id, &state).await?;
                print_single(&order, ctx.format);
                Ok(())
            }
        }
    }
}
