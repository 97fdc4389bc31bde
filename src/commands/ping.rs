//! Latency slash command: /ping

use anyhow::Result;
use log::warn;
use serenity::builder::CreateApplicationCommand;
use serenity::client::bridge::gateway::{ShardId, ShardManager};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::{Context, Mutex, TypeMapKey};
use std::sync::Arc;
use std::time::Duration;

/// Keys the shard manager into the client's TypeMap so /ping can read the
/// gateway heartbeat latency.
pub struct ShardManagerContainer;

impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

/// Creates the ping command
pub fn register() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("ping")
        .description("Checks the bot's latency")
        .to_owned()
}

/// Replies ephemerally with the current gateway heartbeat latency.
pub async fn run(ctx: &Context, interaction: &ApplicationCommandInteraction) -> Result<()> {
    let content = match gateway_latency(ctx).await {
        Some(latency) => format!("Pong! Latency: {}ms", latency.as_millis()),
        None => {
            warn!("Gateway latency not yet measured for shard {}", ctx.shard_id);
            "Pong! Latency has not been measured yet, try again in a moment.".to_string()
        }
    };

    interaction
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;

    Ok(())
}

/// Heartbeat latency of the shard this interaction arrived on. `None` until
/// the first heartbeat acknowledgement.
async fn gateway_latency(ctx: &Context) -> Option<Duration> {
    let data = ctx.data.read().await;
    let shard_manager = data.get::<ShardManagerContainer>()?;
    let manager = shard_manager.lock().await;
    let runners = manager.runners.lock().await;
    runners
        .get(&ShardId(ctx.shard_id))
        .and_then(|runner| runner.latency)
}
