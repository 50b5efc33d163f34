pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::account::PaymentMethod;
use crate::core::auth::SignupRequest;
use crate::core::config::AppConfig;
use crate::core::{AccountService, MarketFeed};
use crate::providers::coingecko::CoinGeckoProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Signup {
        full_name: String,
        email: String,
        password: String,
        confirm_password: String,
        phone: Option<String>,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Dashboard,
    Market {
        watch: bool,
    },
    TopUp {
        amount: String,
        method: PaymentMethod,
    },
    Invest {
        coin: String,
        amount: String,
        days: u32,
    },
    Withdraw {
        id: i64,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Cryptoverse starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = AccountService::new(store::open_user_store(&config)?);
    let seed = providers::seed::seed_from_config(&config.seed);

    let coingecko = &config.providers.coingecko;
    let provider = CoinGeckoProvider::new(&coingecko.base_url, coingecko.retries);
    let feed = MarketFeed::new(Arc::new(provider), coingecko.per_page);

    match command {
        AppCommand::Signup {
            full_name,
            email,
            password,
            confirm_password,
            phone,
        } => {
            let request = SignupRequest {
                full_name,
                email,
                password,
                confirm_password,
                phone,
            };
            cli::account::signup(&service, seed.as_ref(), request).await
        }
        AppCommand::Login { email, password } => {
            cli::account::login(&service, seed.as_ref(), &email, &password).await
        }
        AppCommand::Logout => cli::account::logout(&service).await,
        AppCommand::Dashboard => cli::dashboard::run(&service, &feed).await,
        AppCommand::Market { watch } => {
            cli::market::run(&feed, watch, coingecko.refresh_secs).await
        }
        AppCommand::TopUp { amount, method } => {
            cli::account::top_up(&service, &amount, method).await
        }
        AppCommand::Invest { coin, amount, days } => {
            cli::account::invest(&service, &feed, &coin, &amount, days).await
        }
        AppCommand::Withdraw { id } => cli::account::withdraw(&service, id).await,
    }
}
