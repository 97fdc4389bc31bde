//! # Feature: Verification
//!
//! Button-driven member verification. The /verify command posts a prompt
//! with a single button; pressing it grants the configured role,
//! idempotently, and records the grant in the log channel.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with verify button and verification logging

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use serenity::builder::CreateComponents;
use serenity::model::application::component::ButtonStyle;
use serenity::model::application::interaction::message_component::MessageComponentInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::guild::Member;
use serenity::model::permissions::Permissions;
use serenity::model::Timestamp;
use serenity::prelude::Context;
use std::sync::Arc;

use crate::config::Config;
use crate::permissions;

pub const VERIFY_BUTTON_ID: &str = "verify_button";

/// Handler for all message component interactions
pub struct MessageComponentHandler {
    config: Arc<Config>,
}

/// Creates the action row holding the Verify button.
pub fn create_verify_components() -> CreateComponents {
    CreateComponents::default()
        .create_action_row(|row| {
            row.create_button(|button| {
                button
                    .custom_id(VERIFY_BUTTON_ID)
                    .label("Verify")
                    .style(ButtonStyle::Success)
            })
        })
        .to_owned()
}

impl MessageComponentHandler {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub async fn handle_component_interaction(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        match interaction.data.custom_id.as_str() {
            VERIFY_BUTTON_ID => self.handle_verify_button(ctx, interaction).await,
            other => {
                warn!(
                    "Unknown component interaction: {} from user {}",
                    other, interaction.user.id
                );
                interaction
                    .create_interaction_response(&ctx.http, |response| {
                        response
                            .kind(InteractionResponseType::ChannelMessageWithSource)
                            .interaction_response_data(|message| {
                                message
                                    .content("Unknown component interaction.")
                                    .ephemeral(true)
                            })
                    })
                    .await?;
                Ok(())
            }
        }
    }

    /// Grants the verified role. Defers first: the role grant and the log
    /// write are REST calls that can outlive the initial response window.
    async fn handle_verify_button(
        &self,
        ctx: &Context,
        interaction: &MessageComponentInteraction,
    ) -> Result<()> {
        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|message| message.ephemeral(true))
            })
            .await?;

        let guild_id = match interaction.guild_id {
            Some(id) => id,
            None => {
                edit_reply(ctx, interaction, "This button only works inside a server.").await?;
                return Ok(());
            }
        };
        let member = match interaction.member.as_ref() {
            Some(member) => member,
            None => {
                edit_reply(ctx, interaction, "Error: Could not resolve your membership.").await?;
                return Ok(());
            }
        };

        let guild = ctx
            .cache
            .guild(guild_id)
            .ok_or_else(|| anyhow!("guild {} not in cache", guild_id))?;

        let bot_id = ctx.cache.current_user_id();
        let bot_member = match guild.members.get(&bot_id) {
            Some(member) => member.clone(),
            None => guild_id.member(&ctx, bot_id).await?,
        };
        if !permissions::member_guild_permissions(&guild, &bot_member)
            .contains(Permissions::MANAGE_ROLES)
        {
            error!(
                "Missing 'Manage Roles' permission for verification in guild {}",
                guild_id
            );
            edit_reply(ctx, interaction, "Error: I lack the 'Manage Roles' permission.").await?;
            return Ok(());
        }

        let role_id = self.config.verified_role_id;
        if !guild.roles.contains_key(&role_id) {
            error!("Verified role {} not found in guild {}", role_id, guild_id);
            edit_reply(
                ctx,
                interaction,
                "Error: Verified role not found. Please contact an admin.",
            )
            .await?;
            return Ok(());
        }

        if member.roles.contains(&role_id) {
            edit_reply(
                ctx,
                interaction,
                &format!("{}, you are already verified!", member.user.name),
            )
            .await?;
            return Ok(());
        }

        // Grant first. Logging comes after and must never undo a grant that
        // already succeeded.
        let mut granted = member.clone();
        if let Err(e) = granted.add_role(&ctx.http, role_id).await {
            error!(
                "Error assigning Verified role to {}: {}",
                member.user.tag(),
                e
            );
            edit_reply(
                ctx,
                interaction,
                "Error: Could not assign the Verified role. Please contact an admin.",
            )
            .await?;
            return Ok(());
        }
        info!("Granted verified role {} to {}", role_id, member.user.tag());

        if let Err(e) = self.send_verification_log(ctx, member).await {
            warn!(
                "Failed to write verification log for {}: {}",
                member.user.tag(),
                e
            );
            interaction
                .create_followup_message(&ctx.http, |message| {
                    message
                        .content("Warning: I could not write to the log channel. Admins have been notified.")
                        .ephemeral(true)
                })
                .await?;
        }

        edit_reply(
            ctx,
            interaction,
            "You have been verified and received the Verified role!",
        )
        .await?;

        Ok(())
    }

    async fn send_verification_log(&self, ctx: &Context, member: &Member) -> Result<()> {
        let channel = ctx
            .cache
            .guild_channel(self.config.log_channel_id)
            .ok_or_else(|| anyhow!("log channel {} not found", self.config.log_channel_id))?;

        let permitted = permissions::bot_permissions_in(ctx, channel.id).map_or(false, |held| {
            held.contains(permissions::embed_send_permissions())
        });
        if !permitted {
            return Err(anyhow!(
                "missing permissions to send logs in channel {}",
                channel.id
            ));
        }

        channel
            .send_message(&ctx.http, |message| {
                message.embed(|embed| {
                    embed
                        .title("User Verified")
                        .description(format!("{} was verified.", member.user.tag()))
                        .color(0x00FF00)
                        .field("User ID", member.user.id.to_string(), true)
                        .footer(|footer| footer.text("MDRP Verification Log"))
                        .timestamp(Timestamp::now())
                })
            })
            .await?;

        Ok(())
    }
}

async fn edit_reply(
    ctx: &Context,
    interaction: &MessageComponentInteraction,
    content: &str,
) -> Result<()> {
    interaction
        .edit_original_interaction_response(&ctx.http, |response| response.content(content))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_verify_components() {
        let components = create_verify_components();
        assert!(!components.0.is_empty());

        let serialized = serde_json::to_string(&components.0).unwrap();
        assert!(serialized.contains(VERIFY_BUTTON_ID));
        assert!(serialized.contains("Verify"));
    }
}
