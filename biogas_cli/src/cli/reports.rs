use std::path::PathBuf;

use biogas_client::api::{ExportFormat, ReportKind};
use chrono::NaiveDate;
use clap::{Args, Subcommand};

use crate::cli::common::{ConnectionArgs, write_output};

#[derive(Debug, Args)]
pub(crate) struct ReportsCommand {
    #[command(subcommand)]
    subcmd: ReportsSubcommand,
}

#[derive(Debug, Subcommand)]
enum ReportsSubcommand {
    /// Generate a report for the active filling stage.
    Create {
        /// normal, or final to close the stage.
        #[arg(long, default_value = "normal")]
        kind: ReportKind,

        #[arg(long, default_value = "")]
        observations: String,
    },

    /// Previously generated reports.
    History,

    /// Export readings between two dates.
    Range {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,

        /// excel or csv.
        #[arg(long, default_value = "excel")]
        format: ExportFormat,

        #[arg(long)]
        out: PathBuf,
    },

    /// Download a report file by the URL the backend handed out.
    Download {
        url: String,

        #[arg(long)]
        out: PathBuf,
    },

    /// Expected against measured production of the active stage.
    Production,
}

impl ReportsCommand {
    pub(crate) async fn run(&self, conn: &ConnectionArgs) -> anyhow::Result<()> {
        let client = conn.client()?;
        match &self.subcmd {
            ReportsSubcommand::Create { kind, observations } => {
                let created = client.create_report(*kind, observations).await?;
                println!(
                    "{}",
                    created
                        .detail
                        .as_deref()
                        .unwrap_or("Report generated.")
                );
                for url in [&created.pdf_url, &created.excel_url, &created.csv_url]
                    .into_iter()
                    .flatten()
                {
                    println!("  {url}");
                }
            }
            ReportsSubcommand::History => {
                for report in client.report_history().await? {
                    println!(
                        "{:>4}  {}  {:?}  {}",
                        report.id,
                        report.created_at,
                        report.report_type,
                        report.user_name.as_deref().unwrap_or("-")
                    );
                }
            }
            ReportsSubcommand::Range {
                start,
                end,
                format,
                out,
            } => {
                if end < start {
                    anyhow::bail!("--end must not be before --start");
                }
                let export = client.report_by_range(*start, *end, *format).await?;
                write_output(out, &export)?;
            }
            ReportsSubcommand::Download { url, out } => {
                let file = client.download(url).await?;
                write_output(out, &file)?;
            }
            ReportsSubcommand::Production => {
                let production = client.current_production().await?;
                let stage = &production.stage;
                println!(
                    "Stage {} (#{}) since {}: {} kg {} at {} °C",
                    stage.id,
                    stage.number,
                    stage.date,
                    stage.material_amount_kg,
                    stage.material_type,
                    stage.temperature_c
                );
                if let Some(potential) = production.expected.potential_m3 {
                    println!("Potential: {potential:.2} m³");
                }
                let expected = production.expected.series.cumulative_biogas_m3.last();
                let actual = production.actual.cumulative_biogas_m3.last();
                println!(
                    "Cumulative expected {:.2} m³, measured {:.2} m³",
                    expected.copied().unwrap_or_default(),
                    actual.copied().unwrap_or_default()
                );
            }
        }
        Ok(())
    }
}
