use anyhow::Result;
use log::{error, info};
use serenity::async_trait;
use serenity::model::application::interaction::Interaction;
use serenity::model::gateway::{Activity, Ready};
use serenity::model::guild::Member;
use serenity::model::user::OnlineStatus;
use serenity::prelude::*;
use std::sync::Arc;

use mdrp_assistant::command_handler::CommandHandler;
use mdrp_assistant::commands::ping::ShardManagerContainer;
use mdrp_assistant::config::Config;
use mdrp_assistant::logging;
use mdrp_assistant::member_events;
use mdrp_assistant::message_components::MessageComponentHandler;
use mdrp_assistant::registry::{publish_global_commands, CommandRegistry};

struct Handler {
    config: Arc<Config>,
    registry: Arc<CommandRegistry>,
    command_handler: Arc<CommandHandler>,
    component_handler: Arc<MessageComponentHandler>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.tag());
        info!("📡 Connected to {} guilds", ready.guilds.len());

        ctx.set_presence(
            Some(Activity::watching("Over MDRP Members")),
            OnlineStatus::Online,
        )
        .await;

        if let Err(e) = publish_global_commands(&ctx.http, &self.registry).await {
            error!("❌ Failed to register global slash commands: {}", e);
        } else {
            info!("✅ Successfully registered slash commands globally");
        }
    }

    async fn guild_member_add(&self, ctx: Context, new_member: Member) {
        member_events::handle_member_join(&ctx, &self.config, &new_member).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                if let Err(e) = self
                    .command_handler
                    .handle_slash_command(&ctx, &command)
                    .await
                {
                    error!(
                        "Error handling slash command '{}': {}",
                        command.data.name, e
                    );
                }
            }
            Interaction::MessageComponent(component) => {
                if let Err(e) = self
                    .component_handler
                    .handle_component_interaction(&ctx, &component)
                    .await
                {
                    error!(
                        "Error handling component interaction '{}': {}",
                        component.data.custom_id, e
                    );
                    // The verify flow defers immediately, so the deferred
                    // reply is normally still open for an error message.
                    if let Err(why) = component
                        .edit_original_interaction_response(&ctx.http, |response| {
                            response.content("An error occurred while processing your interaction.")
                        })
                        .await
                    {
                        error!("Failed to deliver component failure reply: {}", why);
                    }
                }
            }
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Configuration must be complete before any connection is attempted.
    let config = Config::from_env()?;
    logging::init(&config.log_level, &config.log_file)?;

    info!("Starting MDRP Assistant...");

    let config = Arc::new(config);
    let registry = Arc::new(CommandRegistry::with_defaults()?);
    let handler = Handler {
        config: Arc::clone(&config),
        registry: Arc::clone(&registry),
        command_handler: Arc::new(CommandHandler::new(Arc::clone(&registry))),
        component_handler: Arc::new(MessageComponentHandler::new(Arc::clone(&config))),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS;

    let mut client = Client::builder(&config.discord_token, intents)
        .application_id(config.application_id)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {}", e);
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(Arc::clone(&client.shard_manager));
    }

    info!("Bot configured successfully. Connecting to Discord gateway...");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {:?}", why);
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
