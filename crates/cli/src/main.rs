use std::sync::Arc;

use {
    anyhow::Context,
    clap::Parser,
    secrecy::Secret,
    tracing::{error, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    mediarelay_pipeline::RelayPipeline,
    mediarelay_telegram::{BotConfig, start_polling},
    mediarelay_telegraph::{TelegraphUploader, account},
};

/// Identity used when provisioning a Telegraph account on first run.
const ACCOUNT_SHORT_NAME: &str = "MediaBot";
const ACCOUNT_AUTHOR_NAME: &str = "Telegram Media Bot";

#[derive(Parser)]
#[command(
    name = "mediarelay",
    about = "Mediarelay — relay Telegram media to Telegraph links"
)]
struct Cli {
    /// Bot token from @BotFather.
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Telegraph access token. An account is provisioned automatically when
    /// this is absent.
    #[arg(long, env = "TELEGRAPH_ACCESS_TOKEN", hide_env_values = true)]
    telegraph_token: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "mediarelay starting");

    let bot_token = cli.bot_token.clone().context("BOT_TOKEN is required")?;

    // Resolve the Telegraph credential once; it is immutable from here on.
    let telegraph_token = match cli.telegraph_token.clone() {
        Some(token) => Secret::new(token),
        None => {
            info!("no Telegraph access token configured, creating an account");
            match account::create_account(
                account::API_BASE,
                ACCOUNT_SHORT_NAME,
                ACCOUNT_AUTHOR_NAME,
            )
            .await
            {
                Ok(token) => {
                    info!("new Telegraph account created");
                    token
                },
                Err(e) => {
                    error!(error = %e, "failed to create Telegraph account");
                    anyhow::bail!("cannot proceed without a valid Telegraph token");
                },
            }
        },
    };

    let uploader = TelegraphUploader::new(Some(telegraph_token));
    let pipeline = Arc::new(RelayPipeline::new(uploader));

    let config = BotConfig {
        token: Secret::new(bot_token),
    };
    let cancel = start_polling(config, pipeline).await?;

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    cancel.cancel();

    Ok(())
}
