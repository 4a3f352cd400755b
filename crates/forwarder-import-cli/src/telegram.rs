//! Telegram adapters for the import pipeline.
//!
//! The pipeline is synchronous, so every MTProto call is driven to completion on a
//! runtime owned by the caller before the next one starts.

use dialoguer::{Input, Password};
use grammers_client::types::{Chat, Downloadable, Media};
use grammers_client::{Client, Config as ClientConfig, InitParams, SignInError};
use grammers_session::{PackedChat, PackedType, Session as ClientSession};
use log::{debug, info};
use std::collections::{HashMap, VecDeque};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

use forwarder_import_core::{BotLogin, Channel, Dialog, Error, Message, Result, Session};

/// Message ids requested per history round trip
const HISTORY_BATCH: i32 = 100;

/// Offset Telegram applies to channel ids in their marked form
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

fn platform<E: Display>(e: E) -> Error {
    Error::Platform(e.to_string())
}

// Bot API style ids, the form used by the Forwarder config
fn marked_id(chat: &PackedChat) -> i64 {
    match chat.ty {
        PackedType::User | PackedType::Bot => chat.id,
        PackedType::Chat => -chat.id,
        _ => -(CHANNEL_ID_OFFSET + chat.id),
    }
}

// Photos, files and stickers carry a downloadable payload
fn is_attachment(media: &Media) -> bool {
    matches!(media, Media::Photo(_) | Media::Document(_) | Media::Sticker(_))
}

async fn connect(api_id: i32, api_hash: &str, session: ClientSession) -> Result<Client> {
    Client::connect(ClientConfig {
        session,
        api_id,
        api_hash: api_hash.to_string(),
        params: InitParams::default(),
    })
    .await
    .map_err(platform)
}

/// User session used to list dialogs and read the channel history
pub struct TelegramSession {
    runtime: Arc<Runtime>,
    client: Client,
    chats: HashMap<i64, PackedChat>,
}

impl TelegramSession {
    /// Connect and sign in, prompting for credentials when the session is not authorized.
    ///
    /// With a `session_file` the authorization is loaded from and saved to that file.
    pub fn connect(
        runtime: Arc<Runtime>,
        api_id: i32,
        api_hash: &str,
        session_file: Option<PathBuf>,
    ) -> Result<Self> {
        let session = match &session_file {
            Some(path) => ClientSession::load_file_or_create(path)?,
            None => ClientSession::new(),
        };

        let client = runtime.block_on(connect(api_id, api_hash, session))?;
        if !runtime.block_on(client.is_authorized()).map_err(platform)? {
            sign_in(&runtime, &client)?;
        }

        if let Some(path) = &session_file {
            client.session().save_to_file(path)?;
            debug!("Saved session state to {}", path.display());
        }

        Ok(Self {
            runtime,
            client,
            chats: HashMap::new(),
        })
    }
}

fn sign_in(runtime: &Runtime, client: &Client) -> Result<()> {
    let phone: String = Input::new()
        .with_prompt("Phone number (international format)")
        .interact_text()
        .map_err(platform)?;
    let token = runtime
        .block_on(client.request_login_code(phone.trim()))
        .map_err(platform)?;

    let code: String = Input::new()
        .with_prompt("Login code")
        .interact_text()
        .map_err(platform)?;

    let user = match runtime.block_on(client.sign_in(&token, code.trim())) {
        Ok(user) => user,
        Err(SignInError::PasswordRequired(password_token)) => {
            let prompt = match password_token.hint() {
                Some(hint) => format!("Password (hint: {})", hint),
                None => "Password".to_string(),
            };
            let password = Password::new()
                .with_prompt(prompt)
                .interact()
                .map_err(platform)?;
            runtime
                .block_on(client.check_password(password_token, password.trim()))
                .map_err(platform)?
        }
        Err(e) => return Err(platform(e)),
    };

    info!("Signed in as user {}", user.id());
    Ok(())
}

impl Session for TelegramSession {
    type Media = Media;
    type History = TelegramHistory;

    fn dialogs(&mut self) -> Result<Vec<Dialog>> {
        let client = self.client.clone();
        let chats: Vec<Chat> = self.runtime.block_on(async move {
            let mut dialogs = client.iter_dialogs();
            let mut chats = Vec::new();
            while let Some(dialog) = dialogs.next().await.map_err(platform)? {
                chats.push(dialog.chat().clone());
            }
            Ok::<_, Error>(chats)
        })?;

        let mut found = Vec::with_capacity(chats.len());
        for chat in chats {
            let packed = chat.pack();
            let id = marked_id(&packed);
            self.chats.insert(id, packed);
            found.push(Dialog {
                name: chat.name().to_string(),
                id,
                is_channel: matches!(chat, Chat::Channel(_)),
            });
        }
        debug!("Session can see {} dialogs", found.len());
        Ok(found)
    }

    fn history(&mut self, channel: &Channel) -> Result<Self::History> {
        let chat = self.chats.get(&channel.id).cloned().ok_or_else(|| {
            Error::Platform(format!("channel {} was not listed in dialogs", channel.id))
        })?;

        let client = self.client.clone();
        let newest = self
            .runtime
            .block_on(async move { client.iter_messages(chat).limit(1).next().await })
            .map_err(platform)?;
        let last_id = newest.map(|message| message.id()).unwrap_or(0);
        debug!("Channel {} history ends at message {}", channel.id, last_id);

        Ok(TelegramHistory {
            runtime: self.runtime.clone(),
            client: self.client.clone(),
            chat,
            next_id: 1,
            last_id,
            buffer: VecDeque::new(),
        })
    }

    fn download(&mut self, media: &Media) -> Result<Vec<u8>> {
        let client = self.client.clone();
        let downloadable = Downloadable::Media(media.clone());
        self.runtime.block_on(async move {
            let mut download = client.iter_download(&downloadable);
            let mut bytes = Vec::new();
            while let Some(chunk) = download
                .next()
                .await
                .map_err(|e| Error::Download(e.to_string()))?
            {
                bytes.extend(chunk);
            }
            Ok(bytes)
        })
    }
}

/// Oldest-first channel history, fetched by ascending message id batches
pub struct TelegramHistory {
    runtime: Arc<Runtime>,
    client: Client,
    chat: PackedChat,
    next_id: i32,
    last_id: i32,
    buffer: VecDeque<Message<Media>>,
}

impl TelegramHistory {
    fn fetch_batch(&mut self) -> Result<()> {
        let end = self.last_id.min(self.next_id.saturating_add(HISTORY_BATCH - 1));
        let ids: Vec<i32> = (self.next_id..=end).collect();
        self.next_id = end.saturating_add(1);

        let messages = self
            .runtime
            .block_on(self.client.get_messages_by_id(self.chat.clone(), &ids))
            .map_err(platform)?;

        // Deleted ids come back empty
        self.buffer
            .extend(messages.into_iter().flatten().map(|message| Message {
                id: i64::from(message.id()),
                media: message.media().filter(is_attachment),
            }));
        Ok(())
    }
}

impl Iterator for TelegramHistory {
    type Item = Result<Message<Media>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Some(Ok(message));
            }
            if self.next_id > self.last_id {
                return None;
            }
            if let Err(e) = self.fetch_batch() {
                self.next_id = self.last_id.saturating_add(1);
                return Some(Err(e));
            }
        }
    }
}

/// Bot authentication on a throwaway in-memory session
pub struct TelegramBotLogin {
    runtime: Arc<Runtime>,
    api_id: i32,
    api_hash: String,
}

impl TelegramBotLogin {
    pub fn new(runtime: Arc<Runtime>, api_id: i32, api_hash: String) -> Self {
        Self {
            runtime,
            api_id,
            api_hash,
        }
    }
}

impl BotLogin for TelegramBotLogin {
    fn bot_identity(&self, secret: &str) -> Result<i64> {
        self.runtime.block_on(async {
            let client = connect(self.api_id, &self.api_hash, ClientSession::new()).await?;
            let bot = client.bot_sign_in(secret).await.map_err(platform)?;
            debug!("Authenticated bot {}", bot.id());
            Ok(bot.id())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grammers_client::grammers_tl_types as tl;

    fn document(attributes: Vec<tl::enums::DocumentAttribute>) -> Option<Media> {
        let document = tl::types::Document {
            id: 1,
            access_hash: 2,
            file_reference: Vec::new(),
            date: 0,
            mime_type: "image/webp".to_string(),
            size: 512,
            thumbs: None,
            video_thumbs: None,
            dc_id: 2,
            attributes,
        };
        Media::from_raw(
            tl::types::MessageMediaDocument {
                nopremium: false,
                spoiler: false,
                video: false,
                round: false,
                voice: false,
                document: Some(document.into()),
                alt_document: None,
                ttl_seconds: None,
            }
            .into(),
        )
    }

    #[test]
    fn test_stickers_are_attachments() {
        let sticker = document(vec![tl::types::DocumentAttributeSticker {
            mask: false,
            alt: "🙂".to_string(),
            stickerset: tl::enums::InputStickerSet::Empty,
            mask_coords: None,
        }
        .into()])
        .unwrap();

        assert!(matches!(sticker, Media::Sticker(_)));
        assert!(is_attachment(&sticker));
    }

    #[test]
    fn test_documents_are_attachments() {
        let file = document(vec![tl::types::DocumentAttributeFilename {
            file_name: "meme.png".to_string(),
        }
        .into()])
        .unwrap();

        assert!(matches!(file, Media::Document(_)));
        assert!(is_attachment(&file));
    }

    #[test]
    fn test_dice_is_not_an_attachment() {
        let dice = Media::from_raw(
            tl::types::MessageMediaDice {
                value: 6,
                emoticon: "🎲".to_string(),
            }
            .into(),
        )
        .unwrap();

        assert!(!is_attachment(&dice));
    }

    #[test]
    fn test_marked_ids() {
        let chat = |ty, id| PackedChat {
            ty,
            id,
            access_hash: None,
        };

        assert_eq!(marked_id(&chat(PackedType::User, 42)), 42);
        assert_eq!(marked_id(&chat(PackedType::Chat, 42)), -42);
        assert_eq!(
            marked_id(&chat(PackedType::Broadcast, 1234567890)),
            -1001234567890
        );
    }
}
