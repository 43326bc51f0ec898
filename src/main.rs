use clap::Parser;
use gitpilot::audit::AuditLogger;
use gitpilot::config::Config;
use gitpilot::error::AppResult;
use gitpilot::error_translation::ErrorTranslator;
use gitpilot::exec::ExecutionCoordinator;
use gitpilot::llm::{OllamaClient, Translator};
use gitpilot::pipeline::Pipeline;
use gitpilot::shell::Shell;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Translate plain-English requests into git commands, check them, and run
/// them after confirmation.
#[derive(Debug, Parser)]
#[command(name = "gitpilot", version)]
struct Cli {
    /// Config file (defaults to ~/.config/gitpilot/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model to ask, overriding the config
    #[arg(long)]
    model: Option<String>,

    /// Ollama base URL, overriding the config
    #[arg(long)]
    endpoint: Option<String>,

    /// Wait for the whole answer instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log pipeline stages to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "gitpilot=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    if let Some(model) = &cli.model {
        config.llm.model = model.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.llm.endpoint = endpoint.clone();
    }
    if cli.no_stream {
        config.llm.stream = false;
    }

    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = load_config(&cli)?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let client = OllamaClient::new(&config.llm)?;
    tracing::debug!(
        model = %client.model(),
        endpoint = %config.llm.endpoint,
        "inference client ready"
    );
    if !client.check_health().await {
        eprintln!(
            "Warning: no Ollama server at {}. Start it with: ollama serve",
            config.llm.endpoint
        );
    }

    let coordinator = ExecutionCoordinator::new(&config.git.remote, &config.git.fallback_branch);
    let mut pipeline = Pipeline::new(Translator::new(Box::new(client)), coordinator)
        .with_follow_up(config.behavior.offer_push_after_commit);

    if config.behavior.log_commands {
        match AuditLogger::new() {
            Ok(audit) => pipeline = pipeline.with_audit(audit),
            Err(e) => tracing::warn!(error = %e, "audit log disabled"),
        }
    }

    let working_dir = std::env::current_dir()?;
    let stdin = io::stdin();
    let mut shell = Shell::new(pipeline, working_dir, stdin.lock(), io::stdout());
    shell.run().await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        let friendly = ErrorTranslator::translate_app_error(&e);
        eprintln!("Error: {}", friendly.simple_message);
        if let Some(suggestion) = friendly.suggestion {
            eprintln!("  {}", suggestion);
        }
        eprintln!("  ({})", friendly.raw_error);
        std::process::exit(1);
    }
}
