//! Embed builder slash command: /embed

use anyhow::{anyhow, Result};
use log::{error, warn};
use serenity::builder::{CreateApplicationCommand, CreateEmbed};
use serenity::model::application::command::CommandOptionType;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::Timestamp;
use serenity::prelude::Context;

use crate::commands::get_string_option;
use crate::permissions;

/// Creates the embed command
pub fn register() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("embed")
        .description("Creates an embedded message")
        .create_option(|option| {
            option
                .name("title")
                .description("The title of the embed")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("description")
                .description("The description of the embed")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("image")
                .description("URL of an image to include in the embed (optional)")
                .kind(CommandOptionType::String)
                .required(false)
        })
        .to_owned()
}

/// Builds and posts a user-defined embed. A bad image URL degrades to an
/// imageless embed plus an ephemeral warning instead of failing the command.
pub async fn run(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    http_client: &reqwest::Client,
) -> Result<()> {
    let options = &interaction.data.options;
    let title = get_string_option(options, "title")
        .ok_or_else(|| anyhow!("missing required option: title"))?;
    let description = get_string_option(options, "description")
        .ok_or_else(|| anyhow!("missing required option: description"))?;
    let image = get_string_option(options, "image");

    let mut invalid_image = false;
    let mut image_url = None;
    if let Some(url) = image {
        if validate_image_url(http_client, &url).await {
            image_url = Some(url);
        } else {
            warn!(
                "Invalid image URL provided by {}: {}",
                interaction.user.tag(),
                url
            );
            invalid_image = true;
        }
    }

    let permitted = permissions::bot_permissions_in(ctx, interaction.channel_id)
        .map_or(false, |held| {
            held.contains(permissions::embed_send_permissions())
        });
    if !permitted {
        error!(
            "Missing permissions to send embeds in channel {}",
            interaction.channel_id
        );
        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message
                            .content("Error: I lack permissions to send embeds in this channel.")
                            .ephemeral(true)
                    })
            })
            .await?;
        return Ok(());
    }

    let embed = build_embed(interaction, &title, &description, image_url.as_deref());

    if invalid_image {
        // The warning consumes the single initial reply; the embed itself
        // goes out as a followup.
        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message
                            .content("Invalid image URL provided. Embed created without image.")
                            .ephemeral(true)
                    })
            })
            .await?;
        interaction
            .create_followup_message(&ctx.http, |message| {
                message.embed(|slot| {
                    *slot = embed;
                    slot
                })
            })
            .await?;
    } else {
        interaction
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|message| {
                        message.embed(|slot| {
                            *slot = embed;
                            slot
                        })
                    })
            })
            .await?;
    }

    Ok(())
}

fn build_embed(
    interaction: &ApplicationCommandInteraction,
    title: &str,
    description: &str,
    image_url: Option<&str>,
) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed
        .title(title)
        .description(description)
        .color(0x0099FF)
        .author(|author| {
            author
                .name(&interaction.user.name)
                .icon_url(interaction.user.face())
        })
        .footer(|footer| footer.text("Created with MDRP | Assistant"))
        .timestamp(Timestamp::now());
    if let Some(url) = image_url {
        embed.image(url);
    }
    embed
}

/// Best-effort check that the URL responds successfully and declares an
/// image content type.
async fn validate_image_url(client: &reqwest::Client, url: &str) -> bool {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(_) => return false,
    };

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());

    response.status().is_success() && is_image_content_type(content_type)
}

fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type.map_or(false, |value| value.trim_start().starts_with("image/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_content_types() {
        assert!(is_image_content_type(Some("image/png")));
        assert!(is_image_content_type(Some("image/jpeg; charset=binary")));
        assert!(!is_image_content_type(Some("text/html; charset=utf-8")));
        assert!(!is_image_content_type(Some("application/json")));
        assert!(!is_image_content_type(None));
    }
}
