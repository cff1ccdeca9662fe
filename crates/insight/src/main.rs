mod config;

use anyhow::Context;
use config::{BotMode, Settings};
use directory::PgDirectory;
use std::sync::Arc;
use std::time::Duration;
use telegram::constants::SWEEP_INTERVAL_SECS;
use telegram::{telegram as bot_setup, Conversation, TelegramMessenger};
use teloxide::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webhook::WebhookServer;

fn init_tracing(json: bool) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    let _ = dotenv::dotenv();

    let settings = Settings::from_env()?;
    init_tracing(settings.json_logs);

    let directory = PgDirectory::connect(&settings.database_url, settings.db_max_connections)
        .await
        .context("Failed to connect to database")?;
    directory
        .migrate()
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    let bot = Bot::new(&settings.bot_token);
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let conversation = Arc::new(
        Conversation::new(
            Arc::new(directory),
            messenger,
            settings.registration_password.clone(),
        )
        .with_ttl(settings.selection_ttl)
        .with_lookup_timeout(settings.lookup_timeout),
    );

    Conversation::spawn_sweeper(
        conversation.clone(),
        Duration::from_secs(SWEEP_INTERVAL_SECS),
    );

    match settings.mode {
        BotMode::Webhook => run_webhook(bot, conversation, &settings).await,
        BotMode::Polling => run_polling(bot, conversation).await,
    }
}

async fn run_webhook(
    bot: Bot,
    conversation: Arc<Conversation>,
    settings: &Settings,
) -> anyhow::Result<()> {
    match settings.webhook_url() {
        Some(url) => {
            bot_setup::register_webhook(&bot, url, settings.webhook_secret_token.as_deref())
                .await
                .context("Failed to register webhook")?;
            if let Err(e) = bot_setup::set_bot_commands(&bot).await {
                tracing::warn!("Failed to set bot commands: {}", e);
            }
        }
        None => tracing::info!("PUBLIC_URL not set, expecting the webhook to be registered already"),
    }

    WebhookServer::new(conversation, settings.webhook_secret_token.clone())
        .with_response_timeout(settings.response_timeout)
        .serve(&settings.host, settings.port)
        .await
        .context("Webhook server failed")
}

async fn run_polling(bot: Bot, conversation: Arc<Conversation>) -> anyhow::Result<()> {
    bot.delete_webhook()
        .await
        .context("Failed to delete webhook before polling")?;
    if let Err(e) = bot_setup::set_bot_commands(&bot).await {
        tracing::warn!("Failed to set bot commands: {}", e);
    }

    tracing::info!("Bot started in polling mode");

    Dispatcher::builder(bot, bot_setup::schema())
        .dependencies(dptree::deps![conversation])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    Ok(())
}
