use std::path::PathBuf;

use biogas_client::api::NewCalibration;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::cli::common::{ConnectionArgs, write_output};

#[derive(Debug, Args)]
pub(crate) struct CalibrationsCommand {
    #[command(subcommand)]
    subcmd: CalibrationsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CalibrationsSubcommand {
    /// Recorded calibrations.
    List,

    /// Record a calibration.
    Add {
        #[arg(long)]
        sensor: String,

        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Save all calibrations as a spreadsheet.
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

impl CalibrationsCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            CalibrationsSubcommand::List => {
                for calibration in client.calibrations().await? {
                    println!(
                        "{:>4}  {}  {:<24} {}",
                        calibration.id, calibration.date, calibration.sensor_name, calibration.notes
                    );
                }
            }
            CalibrationsSubcommand::Add {
                sensor,
                date,
                notes,
            } => {
                let created = client
                    .create_calibration(&NewCalibration {
                        sensor_name: sensor.clone(),
                        date: *date,
                        notes: notes.clone(),
                    })
                    .await?;
                println!("Recorded calibration {}.", created.id);
            }
            CalibrationsSubcommand::Export { out } => {
                let export = client.export_calibrations().await?;
                write_output(out, &export)?;
            }
        }
        Ok(())
    }
}
