use onebridge_channels::gating::is_allowed;

use crate::{config::OnebotSourceConfig, event::MessageEvent};

/// Prefix marking a command message; commands are gated on the admin list
/// instead of the user/group whitelists.
pub const COMMAND_PREFIX: char = '/';

/// Determine if an inbound message may enter the pipeline.
///
/// Command messages (`/...`) require the sender to be on the admin list
/// when one is configured. Plain messages check the user whitelist first
/// (a rejection there stops evaluation), then the group whitelist. Absent
/// whitelists impose no restriction.
pub fn check_access(
    config: &OnebotSourceConfig,
    event: &MessageEvent,
) -> Result<(), AccessDenied> {
    if event.text.starts_with(COMMAND_PREFIX) {
        if !is_allowed(&event.user_id, &config.permission_users) {
            return Err(AccessDenied::NotAdmin);
        }
        return Ok(());
    }

    if !is_allowed(&event.user_id, &config.users) {
        return Err(AccessDenied::UserNotWhitelisted);
    }
    if !is_allowed(&event.group_id, &config.groups) {
        return Err(AccessDenied::GroupNotWhitelisted);
    }
    Ok(())
}

/// Reason an inbound message was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    NotAdmin,
    UserNotWhitelisted,
    GroupNotWhitelisted,
}

impl AccessDenied {
    /// Notice pushed back to the sender, for the denial branches that carry
    /// one. Group rejections stay silent.
    #[must_use]
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Self::NotAdmin => Some("Only administrators may run this command"),
            Self::UserNotWhitelisted => {
                Some("You are not on this bot's user whitelist")
            },
            Self::GroupNotWhitelisted => None,
        }
    }
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAdmin => write!(f, "sender is not an administrator"),
            Self::UserNotWhitelisted => write!(f, "user not on whitelist"),
            Self::GroupNotWhitelisted => write!(f, "group not on whitelist"),
        }
    }
}
