//! Member lifecycle reactors: welcome messages and join logging.

use anyhow::{anyhow, Result};
use log::warn;
use serenity::model::channel::{ChannelType, GuildChannel};
use serenity::model::guild::Member;
use serenity::model::id::ChannelId;
use serenity::model::Timestamp;
use serenity::prelude::Context;

use crate::config::Config;
use crate::permissions;

/// Greets a new member and records the join. The two sends are independent;
/// a failure in one is logged and never blocks the other.
pub async fn handle_member_join(ctx: &Context, config: &Config, member: &Member) {
    if let Err(e) = send_welcome(ctx, config, member).await {
        warn!(
            "Error sending welcome message for {}: {}",
            member.user.tag(),
            e
        );
    }
    if let Err(e) = send_join_log(ctx, config, member).await {
        warn!("Error sending join log for {}: {}", member.user.tag(), e);
    }
}

async fn send_welcome(ctx: &Context, config: &Config, member: &Member) -> Result<()> {
    let channel = sendable_channel(ctx, config.welcome_channel_id)?;
    let guild_name = ctx
        .cache
        .guild(member.guild_id)
        .map(|guild| guild.name)
        .unwrap_or_else(|| "the server".to_string());

    channel
        .send_message(&ctx.http, |message| {
            message.embed(|embed| {
                embed
                    .title("Welcome!")
                    .description(format!(
                        "Hello {}, welcome to **{}**! We're thrilled to have you here. \
                         Please verify yourself to gain access to the server, and make \
                         sure to read the rules. Enjoy your stay!",
                        member.user.tag(),
                        guild_name
                    ))
                    .color(0x4B0066)
                    .thumbnail(member.user.face())
                    .footer(|footer| footer.text("MDRP Welcome System"))
                    .timestamp(Timestamp::now())
            })
        })
        .await?;

    Ok(())
}

async fn send_join_log(ctx: &Context, config: &Config, member: &Member) -> Result<()> {
    let channel = sendable_channel(ctx, config.log_channel_id)?;

    channel
        .send_message(&ctx.http, |message| {
            message.embed(|embed| {
                embed
                    .title("New Member Joined")
                    .description(format!("{} joined the server.", member.user.tag()))
                    .color(0x00FF00)
                    .field("User ID", member.user.id.to_string(), true)
                    .footer(|footer| footer.text("MDRP Join Log"))
                    .timestamp(Timestamp::now())
            })
        })
        .await?;

    Ok(())
}

/// A configured channel is usable when it is cached, text-based, and the bot
/// may send embeds there.
fn sendable_channel(ctx: &Context, channel_id: ChannelId) -> Result<GuildChannel> {
    let channel = ctx
        .cache
        .guild_channel(channel_id)
        .ok_or_else(|| anyhow!("channel {} not found in cache", channel_id))?;

    if !matches!(channel.kind, ChannelType::Text | ChannelType::News) {
        return Err(anyhow!("channel {} is not text-based", channel_id));
    }

    let permitted = permissions::bot_permissions_in(ctx, channel_id).map_or(false, |held| {
        held.contains(permissions::embed_send_permissions())
    });
    if !permitted {
        return Err(anyhow!(
            "missing permissions to send messages in channel {}",
            channel_id
        ));
    }

    Ok(channel)
}
