use biogas_client::api::{Reading, ReadingRange};
use biogas_core::SensorId;
use clap::{Args, Subcommand};

use crate::cli::common::ConnectionArgs;

#[derive(Debug, Args)]
pub(crate) struct SensorsCommand {
    #[command(subcommand)]
    subcmd: SensorsSubcommand,
}

#[derive(Debug, Subcommand)]
enum SensorsSubcommand {
    /// Configured sensors.
    List,

    /// Recorded readings, newest first.
    Readings {
        #[arg(long)]
        sensor: Option<u64>,
    },

    /// Time series of one sensor.
    Data {
        id: u64,

        /// day, week or month.
        #[arg(long, default_value = "day")]
        range: ReadingRange,
    },

    /// Most recent reading of one sensor.
    Latest {
        id: u64,
    },
}

impl SensorsCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            SensorsSubcommand::List => {
                for sensor in client.sensors().await? {
                    println!(
                        "{:>4}  {:<24} {:<32} {:<6} {}",
                        sensor.id,
                        sensor.name,
                        sensor.topic,
                        sensor.unit,
                        if sensor.is_active { "active" } else { "inactive" }
                    );
                }
            }
            SensorsSubcommand::Readings { sensor } => {
                for reading in client.readings(sensor.map(SensorId)).await? {
                    print_reading(&reading);
                }
            }
            SensorsSubcommand::Data { id, range } => {
                for sample in client.sensor_data(SensorId(*id), *range).await? {
                    match sample.observed_at() {
                        Some(at) => println!("{at}  {}", sample.value),
                        None => println!("{}  {}", sample.time, sample.value),
                    }
                }
            }
            SensorsSubcommand::Latest { id } => match client.latest_reading(SensorId(*id)).await? {
                Some(reading) => print_reading(&reading),
                None => println!("No readings for sensor {id}."),
            },
        }
        Ok(())
    }
}

fn print_reading(reading: &Reading) {
    println!(
        "{}  {:<24} {}",
        reading.timestamp, reading.sensor_name, reading.value
    );
}
