//! Verification entry slash command: /verify

use anyhow::Result;
use log::error;
use serenity::builder::CreateApplicationCommand;
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::model::Timestamp;
use serenity::prelude::Context;

use crate::message_components::create_verify_components;
use crate::permissions;

/// Creates the verify command
pub fn register() -> CreateApplicationCommand {
    CreateApplicationCommand::default()
        .name("verify")
        .description("Start the verification process")
        .to_owned()
}

/// Posts the public verification prompt with its Verify button. The button
/// press itself is handled by the component reactor.
pub async fn run(ctx: &Context, interaction: &ApplicationCommandInteraction) -> Result<()> {
    let permitted = permissions::bot_permissions_in(ctx, interaction.channel_id)
        .map_or(false, |held| {
            held.contains(permissions::embed_send_permissions())
        });
    if !permitted {
        error!(
            "Missing permissions to send verification embed in channel {}",
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

    interaction
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| {
                    message
                        .embed(|embed| {
                            embed
                                .title("Verification")
                                .description(
                                    "Click the button below to verify and gain access to the server!",
                                )
                                .color(0x00FF00)
                                .footer(|footer| footer.text("MDRP Verification System"))
                                .timestamp(Timestamp::now())
                        })
                        .set_components(create_verify_components())
                })
        })
        .await?;

    Ok(())
}
