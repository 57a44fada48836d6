use biogas_core::AlertId;
use clap::{Args, Subcommand};

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct AlertsCommand {
    #[command(subcommand)]
    subcmd: AlertsSubcommand,
}

#[derive(Debug, Subcommand)]
enum AlertsSubcommand {
    /// Open alerts.
    List,

    /// Mark an alert as resolved.
    Resolve { id: u64 },
}

impl AlertsCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            AlertsSubcommand::List => {
                let alerts = client.alerts().await?;
                if alerts.is_empty() {
                    println!("No open alerts.");
                }
                for alert in alerts {
                    println!(
                        "{:>4}  {}  {:<8} {}",
                        alert.id, alert.created_at, alert.level, alert.message
                    );
                }
            }
            AlertsSubcommand::Resolve { id } => {
                client.resolve_alert(AlertId(*id)).await?;
                println!("Resolved alert {id}.");
            }
        }
        Ok(())
    }
}
