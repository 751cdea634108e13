use anyhow::Result;
use dotenvy::dotenv;
use log::{info, warn};
use std::sync::Arc;

use admin_notifier::commands::CommandContext;
use admin_notifier::conversation::SessionStore;
use admin_notifier::core::Config;
use admin_notifier::database::SqliteDatabase;
use admin_notifier::features::assistant::AssistantService;
use admin_notifier::features::scheduler::DeliveryScheduler;
use admin_notifier::messaging::{ConsoleMessenger, Messenger};
use admin_notifier::CommandHandler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    info!(
        "starting admin-notifier (zone {}, database {})",
        config.timezone, config.database_path
    );

    let database = SqliteDatabase::open(&config.database_path)?;

    let assistant = match &config.openai_key {
        Some(key) => {
            openai::set_key(key.clone());
            Some(AssistantService::new(config.openai_model.clone()))
        }
        None => {
            warn!("OPENAI_KEY not set; the /ask flow is disabled");
            None
        }
    };

    let messenger: Arc<dyn Messenger> = Arc::new(ConsoleMessenger);

    let ctx = CommandContext::new(
        Arc::new(database.clone()),
        Arc::new(database.clone()),
        Arc::new(database.clone()),
        Arc::new(database.clone()),
        messenger.clone(),
        SessionStore::new(),
        assistant,
        config.timezone,
    );
    let _handler = CommandHandler::new(ctx);
    info!("conversation controller ready; wire a platform gateway to go live");

    let scheduler = DeliveryScheduler::new(
        Arc::new(database.clone()),
        Arc::new(database),
        messenger,
        config.timezone,
    );
    let delivery = scheduler.spawn();

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    delivery.abort();

    Ok(())
}
