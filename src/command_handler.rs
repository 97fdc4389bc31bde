//! Slash-command dispatch: cooldown gating, registry lookup, capability
//! injection, and the per-interaction error boundary.

use anyhow::Result;
use log::{error, info, warn};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;
use std::time::Duration;

use crate::commands;
use crate::cooldown::{CooldownGate, CooldownStore};
use crate::registry::{BotCommand, CommandRegistry};

/// Routes every inbound command interaction. Exactly one of cooldown-denied,
/// not-found, handler-success, or handler-error reply happens per
/// interaction.
pub struct CommandHandler {
    registry: Arc<CommandRegistry>,
    cooldowns: CooldownStore,
    http_client: reqwest::Client,
}

impl CommandHandler {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        CommandHandler {
            registry,
            cooldowns: CooldownStore::default(),
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        interaction: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let command_name = interaction.data.name.clone();
        let user_id = interaction.user.id.0;

        if let CooldownGate::Denied { remaining } =
            self.cooldowns.try_acquire(user_id, &command_name)
        {
            interaction
                .create_interaction_response(&ctx.http, |response| {
                    response
                        .kind(InteractionResponseType::ChannelMessageWithSource)
                        .interaction_response_data(|message| {
                            message
                                .content(cooldown_message(&command_name, remaining))
                                .ephemeral(true)
                        })
                })
                .await?;
            return Ok(());
        }

        let descriptor = match self.registry.resolve(&command_name) {
            Some(descriptor) => descriptor,
            None => {
                // A stale client-side command cache can still deliver names
                // the registry no longer knows.
                warn!("Command {} not found (user {})", command_name, user_id);
                interaction
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message.content("Error: Command not found.").ephemeral(true)
                            })
                    })
                    .await?;
                return Ok(());
            }
        };

        info!(
            "Processing slash command: {} from user: {}",
            command_name, user_id
        );

        let outcome = match descriptor.command {
            BotCommand::Ping => commands::ping::run(ctx, interaction).await,
            BotCommand::Embed => {
                commands::embed::run(ctx, interaction, &self.http_client).await
            }
            BotCommand::RefreshCommands => {
                commands::refresh::run(ctx, interaction, self.registry.as_ref()).await
            }
            BotCommand::Verify => commands::verify::run(ctx, interaction).await,
        };

        if let Err(e) = outcome {
            error!("Error executing command {}: {}", command_name, e);
            self.send_failure_reply(ctx, interaction).await;
        }

        Ok(())
    }

    /// The user must always hear back, even when the handler died after
    /// consuming the initial reply slot.
    async fn send_failure_reply(&self, ctx: &Context, interaction: &ApplicationCommandInteraction) {
        let content = "An error occurred while executing the command.";

        let initial = interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.content(content).ephemeral(true)
                    })
            })
            .await;

        if initial.is_err() {
            if let Err(e) = interaction
                .create_followup_message(&ctx.http, |message| {
                    message.content(content).ephemeral(true)
                })
                .await
            {
                error!(
                    "Failed to deliver failure reply for {}: {}",
                    interaction.data.name, e
                );
            }
        }
    }
}

/// User-facing cooldown denial, remaining time shown to one decimal second.
fn cooldown_message(command_name: &str, remaining: Duration) -> String {
    format!(
        "Please wait {:.1} seconds before using /{} again.",
        remaining.as_secs_f64(),
        command_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_message_rounds_to_one_decimal() {
        let message = cooldown_message("embed", Duration::from_millis(3210));
        assert_eq!(
            message,
            "Please wait 3.2 seconds before using /embed again."
        );
    }

    #[test]
    fn test_cooldown_message_full_window() {
        let message = cooldown_message("ping", Duration::from_millis(5000));
        assert_eq!(message, "Please wait 5.0 seconds before using /ping again.");
    }
}
