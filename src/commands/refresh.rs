//! Admin command-refresh slash command: /refreshcommands

use anyhow::Result;
use log::{error, info};
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::permissions::Permissions;
use serenity::prelude::Context;

use crate::registry::{publish_global_commands, CommandRegistry};

/// Creates the refreshcommands command
pub fn register() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("refreshcommands")
        .description("Refreshes global application commands (Admin only)")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .to_owned()
}

/// Re-publishes the full command list. The definition already gates on
/// administrator; the member is checked again here in case the platform-side
/// gate was relaxed.
pub async fn run(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    registry: &CommandRegistry,
) -> Result<()> {
    let is_admin = interaction
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .map_or(false, |permissions| permissions.administrator());

    if !is_admin {
        reply(ctx, interaction, "You need Administrator permissions to use this command.").await?;
        return Ok(());
    }

    match publish_global_commands(&ctx.http, registry).await {
        Ok(()) => {
            info!("Global commands refreshed by {}", interaction.user.tag());
            reply(ctx, interaction, "Successfully refreshed global application commands.").await?;
        }
        Err(e) => {
            error!("Failed to refresh commands: {}", e);
            reply(ctx, interaction, "Failed to refresh commands. Check logs for details.").await?;
        }
    }

    Ok(())
}

async fn reply(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    content: &str,
) -> Result<()> {
    interaction
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}
