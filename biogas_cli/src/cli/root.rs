use clap::{ArgAction, Parser, Subcommand};

use crate::cli::{
    alerts::AlertsCommand, auth::AuthCommand, calibrations::CalibrationsCommand,
    common::ConnectionArgs, estimate::EstimateCommand, institution::InstitutionCommand,
    reports::ReportsCommand, resources::ResourcesCommand, sensors::SensorsCommand,
    users::UsersCommand,
};

pub(crate) fn get_args() -> CliOpts {
    CliOpts::parse()
}

#[derive(Debug, Parser)]
#[command(
    version = clap::crate_version!(),
    about = "Command-line client for the biodigester monitoring backend"
)]
pub(crate) struct CliOpts {
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    subcmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in, inspect and end the stored session.
    Auth(AuthCommand),

    /// List and approve user accounts.
    Users(UsersCommand),

    /// Sensors and their readings.
    Sensors(SensorsCommand),

    /// Production reports and exports.
    Reports(ReportsCommand),

    /// Sensor calibration records.
    Calibrations(CalibrationsCommand),

    /// Dashboard alerts.
    Alerts(AlertsCommand),

    /// Files shared within the selected institution.
    Resources(ResourcesCommand),

    /// Select the institution used by resource commands.
    Institution(InstitutionCommand),

    /// Estimate biogas production with the Gompertz model.
    Estimate(EstimateCommand),
}

impl CliOpts {
    pub(crate) fn verbose(&self) -> u8 {
        self.verbose
    }

    pub(crate) async fn run(&self) -> anyhow::Result<()> {
        let conn = &self.connection;
        match &self.subcmd {
            Command::Auth(cmd) => cmd.run(conn).await,
            Command::Users(cmd) => cmd.run(conn).await,
            Command::Sensors(cmd) => cmd.run(conn).await,
            Command::Reports(cmd) => cmd.run(conn).await,
            Command::Calibrations(cmd) => cmd.run(conn).await,
            Command::Alerts(cmd) => cmd.run(conn).await,
            Command::Resources(cmd) => cmd.run(conn).await,
            Command::Institution(cmd) => cmd.run(conn),
            Command::Estimate(cmd) => cmd.run(conn).await,
        }
    }
}
