use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use rtdb_race::Client;
use rtdb_race::Result;
use rtdb_race::ScenarioRunner;
use rtdb_race::Settings;
use tracing::error;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database endpoint, overrides `RTDB__DATABASE__URL`
    #[arg(long)]
    database_url: Option<String>,

    /// Service-account credential file, overrides `RTDB__DATABASE__CERT`
    #[arg(long)]
    cert: Option<PathBuf>,

    /// Extra configuration file
    #[arg(long)]
    config: Option<String>,

    /// Where the emulated database keeps its state between runs, overrides
    /// `RTDB__EMULATOR__STATE_DIR` (default: `rtdb-race` under the system
    /// temp directory)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Pause between the call transactions and the user transaction,
    /// overrides `RTDB__SCENARIO__PAUSE_BEFORE_USER_UPDATE_MS`
    #[arg(long, global = true)]
    pause_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the user record with its calls
    Reset,
    /// Race three transactions against the seeded record
    Race,
    /// Repeat reset + race and report how often calls were lost
    Probe {
        #[arg(long)]
        iterations: Option<usize>,
    },
    /// Reset, then race
    All,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    init_observability();

    match execute(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("scenario failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let mut settings =
        Settings::load(cli.config.as_deref())?.with_database_overrides(cli.database_url, cli.cert);
    if let Some(pause_ms) = cli.pause_ms {
        settings.scenario.pause_before_user_update_ms = pause_ms;
    }
    if let Some(state_dir) = cli.state_dir {
        settings.emulator.state_dir = Some(state_dir);
    }
    if settings.emulator.state_dir.is_none() {
        settings.emulator.state_dir = Some(std::env::temp_dir().join("rtdb-race"));
    }
    settings.validate()?;

    let client = Client::connect(&settings).await?;
    let runner = ScenarioRunner::new(client.database(), settings.scenario.clone());

    let result = run(&runner, &cli.command).await;
    client.shutdown();
    result
}

async fn run(
    runner: &ScenarioRunner,
    command: &Commands,
) -> Result<()> {
    match command {
        Commands::Reset => {
            runner.reset().await?;
        }
        Commands::Race => {
            let report = runner.race().await?;
            info!(
                "race finished: call {} written, {} of 3 transactions committed",
                report.call_id,
                report.committed()
            );
        }
        Commands::Probe { iterations } => {
            let iterations = iterations.unwrap_or(runner.config().probe_iterations);
            let report = runner.probe(iterations).await?;
            println!(
                "reproduced {} of {} races (worst loss: {} calls)",
                report.reproduced, report.iterations, report.worst_loss
            );
        }
        Commands::All => {
            runner.reset().await?;
            runner.race().await?;
        }
    }
    Ok(())
}

fn init_observability() {
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(base_subscriber).init();
}
