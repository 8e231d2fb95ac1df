//! Gaze Sequence Pipeline - Main Entry Point

use pipeline::cli::{Cli, Commands};
use pipeline::{init_logging, run, Settings};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    init_logging(cli.verbose)?;

    info!("=== Gaze Sequence Pipeline v{} ===", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Run {
            input,
            output,
            settings,
            serial,
        } => {
            let mut loaded = Settings::load(settings.config.as_deref(), settings.variant.as_deref())?;
            if serial {
                loaded.parallel = false;
            }
            let report = run(&loaded, &input, &output)?;
            for path in &report.written {
                info!("Output: {}", path.display());
            }
        }
        Commands::CheckConfig { settings } => {
            let loaded = Settings::load(settings.config.as_deref(), settings.variant.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&loaded)?);
            info!("Settings are valid");
        }
    }

    Ok(())
}
