use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voice_router::config::LoadOptions;
use voice_router::{ActionRegistry, Assistant, Catalogue, Config, Daemon, Services};

/// Voice Router - push-to-talk voice command router
#[derive(Parser)]
#[command(name = "voice-router", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/voice-router/config.toml)
    #[arg(short, long, env = "VOICE_ROUTER_CONFIG")]
    config: Option<PathBuf>,

    /// Command catalogue JSON
    #[arg(long)]
    catalogue: Option<PathBuf>,

    /// Directory for memory, watchdog state and the speech cache
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,voice_router=info",
        1 => "info,voice_router=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = LoadOptions {
        config_file: cli.config,
        catalogue: cli.catalogue,
        data_dir: cli.data_dir,
    };
    let config = Config::load(&options)?;
    tracing::debug!(data_dir = %config.data_dir.display(), "loaded configuration");

    let catalogue = Catalogue::load(&config.catalogue_path)?;
    let registry = ActionRegistry::with_builtins()?;

    if which::which(&config.voice.piper_path).is_err() {
        tracing::warn!(
            piper = %config.voice.piper_path.display(),
            "piper not found, speech output will fail"
        );
    }

    let services = Services::from_config(&config)?;
    let assistant = Assistant::new(config, catalogue, registry, services)?;

    tracing::info!(
        catalogue = %assistant.config().catalogue_path.display(),
        key = %assistant.config().ptt_key,
        "starting voice router"
    );

    Daemon::new(assistant)?.run().await?;
    Ok(())
}
