use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cryptoverse::cli::account::PaymentMethod;
use cryptoverse::core::log::init_logging;

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

impl From<Commands> for cryptoverse::AppCommand {
    fn from(cmd: Commands) -> cryptoverse::AppCommand {
        use cryptoverse::AppCommand;
        match cmd {
            Commands::Signup {
                full_name,
                email,
                password,
                confirm_password,
                phone,
            } => AppCommand::Signup {
                full_name,
                email,
                password,
                confirm_password,
                phone,
            },
            Commands::Login { email, password } => AppCommand::Login { email, password },
            Commands::Logout => AppCommand::Logout,
            Commands::Dashboard => AppCommand::Dashboard,
            Commands::Market { watch } => AppCommand::Market { watch },
            Commands::TopUp { amount, method } => AppCommand::TopUp { amount, method },
            Commands::Invest { coin, amount, days } => AppCommand::Invest { coin, amount, days },
            Commands::Withdraw { id } => AppCommand::Withdraw { id },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_days(value: &str) -> Result<u32, String> {
    match value.trim().parse::<u32>() {
        Ok(days @ (7 | 30 | 90)) => Ok(days),
        _ => Err(format!("{value} is not a supported term, pick 7, 30 or 90")),
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Create an account and log in
    Signup {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Log in with an existing account
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Display balances, allocation, investments and live prices
    Dashboard,
    /// Display the top coins by market cap
    Market {
        /// Keep refreshing until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// Add funds to the account balance
    TopUp {
        amount: String,
        #[arg(short, long, value_enum, default_value_t = PaymentMethod::default())]
        method: PaymentMethod,
    },
    /// Lock funds in a coin for a fixed term
    Invest {
        #[arg(long)]
        coin: String,
        #[arg(long)]
        amount: String,
        /// Term in days: 7, 30 or 90
        #[arg(long, value_parser = parse_days)]
        days: u32,
    },
    /// Withdraw a matured investment
    Withdraw { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => cryptoverse::cli::setup::setup_at_path(path),
            None => cryptoverse::cli::setup::setup(),
        },
        Some(cmd) => cryptoverse::run_command(cmd.into(), cli.config_path.as_deref()).await,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_days() {
        assert_eq!(parse_days("7"), Ok(7));
        assert_eq!(parse_days("90"), Ok(90));
        assert!(parse_days("14").is_err());
        assert!(parse_days("week").is_err());
    }

    #[test]
    fn test_cli_parses_invest() {
        let cli = Cli::try_parse_from([
            "cryptoverse",
            "invest",
            "--coin",
            "Bitcoin",
            "--amount",
            "200",
            "--days",
            "30",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Invest { days: 30, .. })
        ));
        assert!(
            Cli::try_parse_from([
                "cryptoverse",
                "invest",
                "--coin",
                "Bitcoin",
                "--amount",
                "1",
                "--days",
                "5",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }
}
