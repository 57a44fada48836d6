mod cli;

const OWN_CRATES: [&str; 3] = ["biogas", "biogas_client", "biogas_core"];

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::get_args();
    init_logging(cmd.verbose());
    log::trace!("parsed arguments: {:?}", cmd);

    if let Err(error) = cmd.run().await {
        log::error!("{:?}", error);
        std::process::exit(1);
    }
    Ok(())
}

/// `-v` raises the level of our own crates; HTTP internals stay at warn
/// unless `-vvvv` is given. `RUST_LOG` still applies on top.
fn init_logging(verbosity: u8) {
    let own_level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let deps_level = if verbosity >= 4 {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Warn
    };

    let mut builder = pretty_env_logger::formatted_timed_builder();
    builder.filter_level(deps_level);
    for krate in OWN_CRATES {
        builder.filter_module(krate, own_level);
    }
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.format_timestamp_millis();
    builder.init();
}
