use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use userdao::{CommandRegistry, DaoProvider};

mod cli;
mod output;

use cli::{Cli, Commands};
use output::ConsoleReporter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("userdao=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.backend_config().await?;
    tracing::debug!(?config, "Backend configuration");

    let provider = DaoProvider::init(config).await?;
    let registry = provider.commands();

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Run { name, args } => {
            // Already reported by dispatch; only the exit status is left to set
            if registry.dispatch(&name, &args, &ConsoleReporter).await.is_err() {
                std::process::exit(1);
            }
        }
        Commands::ListCommands => println!("{}", registry.usage()),
        Commands::Console => run_console(&registry).await?,
    }

    Ok(())
}

/// Read commands from stdin until EOF or `exit`.
///
/// A failing command is reported and the console keeps going.
async fn run_console(registry: &CommandRegistry) -> std::io::Result<()> {
    println!("userdao console. Type 'help' for commands, 'exit' to quit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            continue;
        };
        let args: Vec<String> = words.map(str::to_string).collect();

        match name {
            "exit" | "quit" => break,
            "help" => println!("{}", registry.usage()),
            // Failures are already reported by dispatch
            _ => {
                let _ = registry.dispatch(name, &args, &ConsoleReporter).await;
            }
        }
    }

    Ok(())
}
