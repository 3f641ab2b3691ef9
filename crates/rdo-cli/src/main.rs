mod cmd;
mod output;

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand, ValueEnum};
use rdo_core::models::DeployMode;

#[derive(Parser)]
#[command(
    name = "rdo",
    about = "Health-gated deployment orchestrator for replicated Redis stacks",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Basic,
    Sentinel,
    Full,
}

impl From<ModeArg> for DeployMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Basic => DeployMode::Basic,
            ModeArg::Sentinel => DeployMode::Sentinel,
            ModeArg::Full => DeployMode::Full,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold .env (with a generated password) and the compose descriptor
    Init,

    /// Validate configuration and plan without any side effect
    Validate {
        /// Mode to validate against
        #[arg(long, value_enum, default_value = "basic")]
        mode: ModeArg,
    },

    /// Build and tag the Redis image
    Build,

    /// Deploy the base stack (primary + replicas)
    Deploy,

    /// Deploy with the monitoring profile
    DeployMonitoring,

    /// Deploy the full HA stack (sentinel + monitoring + load balancer)
    DeployHa,

    /// Bring up and verify a replicated deployment
    Replicate {
        #[arg(value_enum)]
        mode: ModeArg,
    },

    /// Show stack and replication status
    Status,

    /// Back up the primary's dataset
    Backup {
        /// Directory to write the dump into
        #[arg(long, default_value = "backups")]
        dir: PathBuf,
    },

    /// Run the replication probe against an already-running stack
    Test,

    /// Tail a service's container logs (primary by default)
    Logs {
        service: Option<String>,
        #[arg(long, default_value = "50")]
        lines: u32,
    },

    /// Attach an interactive redis-cli to the primary
    Cli,

    /// Stop and remove the stack
    Stop,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    // Bad invocations exit 1 with usage on stderr; help and version are
    // not failures.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let result = tokio::select! {
        result = dispatch(cli.command) => result,
        _ = tokio::signal::ctrl_c() => {
            output::warning(
                "interrupted; services already started are left running (run 'rdo stop' to tear down)",
            );
            std::process::exit(130);
        }
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Init => cmd::init::run(),
        Commands::Validate { mode } => cmd::validate::run(mode.into()),
        Commands::Build => cmd::build::run().await,
        Commands::Deploy => cmd::deploy::run(DeployMode::Basic, &[]).await,
        Commands::DeployMonitoring => cmd::deploy::run(DeployMode::Basic, &["monitoring"]).await,
        Commands::DeployHa => {
            cmd::deploy::run(DeployMode::Full, &["sentinel", "monitoring", "loadbalancer"]).await
        }
        Commands::Replicate { mode } => {
            let mode: DeployMode = mode.into();
            cmd::deploy::run(mode, mode.profiles()).await
        }
        Commands::Status => cmd::status::run().await,
        Commands::Backup { dir } => cmd::backup::run(&dir).await,
        Commands::Test => cmd::test::run().await,
        Commands::Logs { service, lines } => cmd::logs::run(service.as_deref(), lines).await,
        Commands::Cli => cmd::cli::run().await,
        Commands::Stop => cmd::stop::run().await,
    }
}
