//! pcmk-ctl: Pacemaker control for deployment playbooks.
//!
//! Every subcommand prints a single JSON result on stdout and exits
//! non-zero when it failed. Logs go to stderr (`RUST_LOG`, default
//! `pcmk_ctl=info`).

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pcmk_ctl::report::Report;
use pcmk_ctl::resource::ResourceState;
use pcmk_ctl::{CommandRunner, SystemRunner};

mod commands;

/// Pacemaker cluster control
#[derive(Parser, Debug)]
#[command(name = "pcmk-ctl", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Wait until a resource runs its expected number of instances
    IsActive(IsActiveArgs),
    /// Check or change the state of the cluster or its nodes
    Cluster(ClusterArgs),
    /// Check or change the state of a resource
    Resource(ResourceArgs),
}

#[derive(Args, Debug)]
struct IsActiveArgs {
    /// Resource name, without any "-clone" or "-master" suffix
    #[arg(short, long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    resource: String,

    /// Seconds to wait for the resource to become active
    #[arg(long, default_value_t = pcmk_ctl::reconciler::DEFAULT_MAX_WAIT,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_wait: u32,

    /// Match the resource id exactly instead of by substring
    #[arg(long)]
    exact_match: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ClusterAction {
    Online,
    Offline,
    Restart,
    Cleanup,
}

#[derive(Args, Debug)]
struct ClusterArgs {
    /// Desired state of the cluster
    #[arg(long, value_enum)]
    state: ClusterAction,

    /// Fail if the current state differs instead of changing it
    #[arg(long)]
    check_and_fail: bool,

    /// Node to manage ("all" for every node); the whole cluster if omitted
    #[arg(long)]
    node: Option<String>,

    /// Seconds to wait for the state change
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Force stopping the cluster
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    force: bool,
}

#[derive(Args, Debug)]
struct ResourceArgs {
    /// Desired (or, with --check-mode, expected) state
    #[arg(long, value_enum)]
    state: ResourceState,

    /// Resource to handle
    #[arg(long, value_parser = clap::builder::NonEmptyStringValueParser::new())]
    resource: String,

    /// Seconds to wait for the action or the state
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Only check whether the resource is in the given state
    #[arg(long)]
    check_mode: bool,

    /// With --check-mode, wait up to --timeout for the state
    #[arg(long)]
    wait_for_resource: bool,
}

fn main() -> Result<ExitCode> {
    // Initialize logging; stdout is reserved for the JSON result
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pcmk_ctl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // One poll loop, no parallelism: a current-thread runtime is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);

    let outcome = runtime.block_on(async {
        match cli.command {
            Commands::IsActive(args) => commands::is_active(runner, args).await,
            Commands::Cluster(args) => commands::cluster(runner, args).await,
            Commands::Resource(args) => commands::resource(runner, args).await,
        }
    });

    let report = outcome.unwrap_or_else(|e| {
        error!("{}", e);
        Report::failure(e.to_string())
    });

    println!("{}", report.to_json());
    Ok(report.exit_code())
}
