use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use devise::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List supported currencies
    Currencies,
    /// Display the latest rates for a base currency
    Rates {
        /// Base currency, defaults to the configured currency
        #[arg(short, long)]
        base: Option<String>,
        /// Ignore cached rates
        #[arg(short, long)]
        refresh: bool,
    },
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert; a decimal comma is accepted
        amount: String,
        /// Source currency, defaults to the configured currency
        from: Option<String>,
        /// Target currency, defaults to the configured target currency
        to: Option<String>,
        /// Treat the amount as entered in the target currency
        #[arg(short, long)]
        target: bool,
        /// Ignore cached rates
        #[arg(short, long)]
        refresh: bool,
    },
    /// Display historical rates for a currency pair
    History {
        base: String,
        target: String,
        /// Lookback window in years: 1, 5 or 15
        #[arg(short, long, default_value_t = 1)]
        years: u32,
        /// Ignore cached series
        #[arg(short, long)]
        refresh: bool,
    },
    /// Manage the rate cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove all cached rates
    Clear,
}

impl From<Commands> for devise::AppCommand {
    fn from(cmd: Commands) -> devise::AppCommand {
        match cmd {
            Commands::Currencies => devise::AppCommand::Currencies,
            Commands::Rates { base, refresh } => devise::AppCommand::Rates { base, refresh },
            Commands::Convert {
                amount,
                from,
                to,
                target,
                refresh,
            } => devise::AppCommand::Convert {
                amount,
                from,
                to,
                edit_target: target,
                refresh,
            },
            Commands::History {
                base,
                target,
                years,
                refresh,
            } => devise::AppCommand::History {
                base,
                target,
                years,
                refresh,
            },
            Commands::Cache {
                action: CacheAction::Clear,
            } => devise::AppCommand::ClearCache,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => devise::cli::setup::setup(cli.config_path.as_deref()).map(|path| {
            println!("Created default configuration at {}", path.display());
        }),
        Some(cmd) => devise::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
