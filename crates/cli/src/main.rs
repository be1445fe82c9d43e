use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use harmony_cli::{
    config::{DEFAULT_PLAN_PATH, load_plan},
    plan::{Plan, completion_json, run_plan},
};

#[derive(Debug, Parser)]
#[command(name = "harmony", about = "Run context/serial/parallel task plans", version)]
struct Cli {
    /// Path to the plan file
    #[arg(short, long, env = "HARMONY_PLAN", default_value = DEFAULT_PLAN_PATH, value_name = "FILE")]
    plan: PathBuf,

    /// Log orchestration details (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Execute the plan and print the results as JSON
    Run,

    /// Validate the plan and print what each phase will run
    Check,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match load_plan(&cli.plan) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("{error}");
            std::process::exit(1);
        }
    };
    let plan = Plan::from_config(config)?;

    match cli.command {
        Some(Commands::Run) => handle_run(&plan).await?,
        Some(Commands::Check) => print!("{}", plan.summary()),
        None => {
            println!("Loaded plan from {}", cli.plan.display());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_run(plan: &Plan) -> eyre::Result<()> {
    match run_plan(plan).await {
        Ok(completion) => {
            println!("{}", serde_json::to_string_pretty(&completion_json(completion))?);
            Ok(())
        }
        Err(fault) => {
            eprintln!("{fault}");
            std::process::exit(1);
        }
    }
}
