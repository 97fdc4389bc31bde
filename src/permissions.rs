//! Guild and channel permission checks shared by command handlers and event
//! reactors.

use serenity::model::guild::{Guild, Member};
use serenity::model::id::{ChannelId, RoleId};
use serenity::model::permissions::Permissions;
use serenity::prelude::Context;

/// SEND_MESSAGES + EMBED_LINKS, required by every embed send path.
pub fn embed_send_permissions() -> Permissions {
    Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS
}

/// Folds guild-level permissions: the owner and ADMINISTRATOR short-circuit
/// to all, otherwise the union of @everyone and the member's roles.
pub fn fold_guild_permissions(
    is_owner: bool,
    everyone: Permissions,
    role_permissions: impl IntoIterator<Item = Permissions>,
) -> Permissions {
    if is_owner {
        return Permissions::all();
    }

    let mut permissions = everyone;
    for role in role_permissions {
        permissions |= role;
    }

    if permissions.contains(Permissions::ADMINISTRATOR) {
        Permissions::all()
    } else {
        permissions
    }
}

/// Guild-level permissions of a member, computed from the cached guild.
pub fn member_guild_permissions(guild: &Guild, member: &Member) -> Permissions {
    // The @everyone role shares the guild's id.
    let everyone = guild
        .roles
        .get(&RoleId(guild.id.0))
        .map(|role| role.permissions)
        .unwrap_or_else(Permissions::empty);

    let role_permissions: Vec<Permissions> = member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id).map(|role| role.permissions))
        .collect();

    fold_guild_permissions(guild.owner_id == member.user.id, everyone, role_permissions)
}

/// Permissions the bot user holds in a channel, from the cache. `None` when
/// the channel is not a cached guild channel.
pub fn bot_permissions_in(ctx: &Context, channel_id: ChannelId) -> Option<Permissions> {
    let channel = ctx.cache.guild_channel(channel_id)?;
    channel
        .permissions_for_user(&ctx.cache, ctx.cache.current_user_id())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_has_all_permissions() {
        let permissions = fold_guild_permissions(true, Permissions::empty(), []);
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn test_administrator_role_grants_all() {
        let permissions = fold_guild_permissions(
            false,
            Permissions::SEND_MESSAGES,
            [Permissions::ADMINISTRATOR],
        );
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn test_roles_union_with_everyone() {
        let permissions = fold_guild_permissions(
            false,
            Permissions::SEND_MESSAGES,
            [Permissions::MANAGE_ROLES, Permissions::EMBED_LINKS],
        );
        assert!(permissions.contains(Permissions::SEND_MESSAGES));
        assert!(permissions.contains(Permissions::MANAGE_ROLES));
        assert!(permissions.contains(Permissions::EMBED_LINKS));
        assert!(!permissions.contains(Permissions::BAN_MEMBERS));
    }

    #[test]
    fn test_no_roles_means_everyone_only() {
        let permissions = fold_guild_permissions(false, Permissions::SEND_MESSAGES, []);
        assert_eq!(permissions, Permissions::SEND_MESSAGES);
    }

    #[test]
    fn test_embed_send_permissions_contents() {
        let required = embed_send_permissions();
        assert!(required.contains(Permissions::SEND_MESSAGES));
        assert!(required.contains(Permissions::EMBED_LINKS));
    }
}
