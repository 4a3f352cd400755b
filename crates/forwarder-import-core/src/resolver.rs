//! Resolves which bot owns the imported entries for a channel.

use log::{debug, info};
use std::path::Path;

use crate::config::BotMapping;
use crate::error::{Error, Result};
use crate::platform::BotLogin;

/// Determine the bot id for a channel.
///
/// A non-zero `explicit_bot_id` is returned as is and the config file is never
/// touched. Otherwise the first usable bot record for `channel_id` in the config at
/// `config_path` is authenticated through `login` to read back its numeric id.
///
/// # Errors
///
/// * [`Error::Configuration`] if the config is missing, unreadable or not a non-empty object
/// * [`Error::NoBotFound`] if no usable record owns the channel
/// * any error raised by `login` while authenticating the bot
pub fn resolve_bot<L: BotLogin + ?Sized>(
    explicit_bot_id: i64,
    channel_id: i64,
    config_path: &Path,
    login: &L,
) -> Result<i64> {
    if explicit_bot_id != 0 {
        debug!("Using explicit BotID {}", explicit_bot_id);
        return Ok(explicit_bot_id);
    }

    let mapping = BotMapping::from_file(config_path)?;
    debug!(
        "Loaded {} bot record(s) from {}",
        mapping.bots.len(),
        config_path.display()
    );

    let record = mapping
        .find(channel_id)
        .ok_or(Error::NoBotFound(channel_id))?;

    let bot_id = login.bot_identity(&record.telegram_key)?;
    if bot_id == 0 {
        return Err(Error::NoBotFound(channel_id));
    }

    info!("Resolved BotID {} for channel {}", bot_id, channel_id);
    Ok(bot_id)
}
