//! Messaging platform boundary.
//!
//! The pipeline never talks to the network itself. It consumes an authenticated
//! [`Session`] passed in by the caller, and a [`BotLogin`] used once to read back
//! the owning bot's identity. Both are implemented by the binary on top of a real
//! Telegram client and by fakes in tests.

use crate::error::Result;

/// A dialog visible to the authenticated session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// Display name shown in the dialog list
    pub name: String,

    /// Numeric chat identifier
    pub id: i64,

    /// True for broadcast channels, false for groups, supergroups and users
    pub is_channel: bool,
}

/// The channel an import run targets, resolved once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub name: String,
    pub id: i64,
}

impl From<Dialog> for Channel {
    fn from(dialog: Dialog) -> Self {
        Self {
            name: dialog.name,
            id: dialog.id,
        }
    }
}

/// One message from a channel history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<M> {
    /// Monotonically increasing message identifier
    pub id: i64,

    /// Opaque handle to the attached media, if any
    pub media: Option<M>,
}

/// Long-lived authenticated session used for channel and message access
pub trait Session {
    /// Adapter-specific handle to downloadable media
    type Media;

    /// Iterator over a channel history, oldest message first
    type History: Iterator<Item = Result<Message<Self::Media>>>;

    /// List the dialogs visible to the session, in the order the platform returns them
    fn dialogs(&mut self) -> Result<Vec<Dialog>>;

    /// Open the channel history for oldest-first iteration
    fn history(&mut self, channel: &Channel) -> Result<Self::History>;

    /// Download the full media payload, never a thumbnail variant
    fn download(&mut self, media: &Self::Media) -> Result<Vec<u8>>;
}

/// Short-lived bot authentication, independent of the main [`Session`]
pub trait BotLogin {
    /// Authenticate with a bot secret and return the bot's own numeric id
    fn bot_identity(&self, secret: &str) -> Result<i64>;
}
