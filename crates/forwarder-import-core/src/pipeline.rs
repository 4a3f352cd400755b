//! Streams a channel history and collects one import entry per unique image.

use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::{
    expand_path, Config, DEFAULT_DOWNLOAD_RETRIES, DEFAULT_PROGRESS_INTERVAL,
};
use crate::error::{Error, Result};
use crate::logging::{log_download_error, log_media_skip};
use crate::manifest::{ImportEntry, Manifest};
use crate::platform::{BotLogin, Channel, Message, Session};
use crate::processing::fingerprint;
use crate::progress::ImportProgress;
use crate::resolver::resolve_bot;

/// Counters collected while streaming a history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Messages pulled from the stream
    pub examined: usize,
    /// Messages that carried an attachment
    pub media: usize,
    /// Unique images kept in the manifest
    pub entries: usize,
    /// Images dropped because their perceptual hash was already seen
    pub duplicates: usize,
    /// Attachments that did not decode as an image
    pub non_images: usize,
    /// Attachments that could not be downloaded after all retries
    pub download_failures: usize,
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub channel: Channel,
    pub bot_id: i64,
    pub output: PathBuf,
    pub stats: ImportStats,
}

/// Find the first broadcast channel whose display name matches exactly
pub fn find_channel<S: Session + ?Sized>(session: &mut S, name: &str) -> Result<Channel> {
    session
        .dialogs()?
        .into_iter()
        .find(|dialog| dialog.is_channel && dialog.name == name)
        .map(Channel::from)
        .ok_or_else(|| Error::ChannelNotFound(name.to_string()))
}

/// Import pipeline over an authenticated session
pub struct Importer<'a, S: Session> {
    session: &'a mut S,
    progress: ImportProgress,
    download_retries: u32,
    shutdown: Arc<AtomicBool>,
}

impl<'a, S: Session> Importer<'a, S> {
    /// Create an importer with hidden progress and the default download retries
    pub fn new(session: &'a mut S) -> Self {
        Self {
            session,
            progress: ImportProgress::hidden(DEFAULT_PROGRESS_INTERVAL),
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Configure how progress is reported
    pub fn with_progress(mut self, progress: ImportProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Configure extra download attempts per attachment
    pub fn with_download_retries(mut self, retries: u32) -> Self {
        self.download_retries = retries;
        self
    }

    /// Share a flag that aborts the stream when set
    pub fn with_shutdown(mut self, shutdown: Arc<AtomicBool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Run the full import: channel, bot, stream, then write the manifest.
    ///
    /// The retry count and checkpoint interval come from `config`, replacing any set
    /// through the builders. Nothing is written unless the whole history was streamed.
    pub fn run<L: BotLogin + ?Sized>(
        &mut self,
        config: &Config,
        login: &L,
    ) -> Result<ImportSummary> {
        config.validate()?;
        self.download_retries = config.download_retries;
        self.progress.set_interval(config.progress_interval);

        let channel = find_channel(&mut *self.session, &config.channel_name)?;
        info!("Found Channel \"{}\" with ID {}..", channel.name, channel.id);

        let bot_id = resolve_bot(
            config.bot_id,
            channel.id,
            &expand_path(&config.bot_config),
            login,
        )?;

        let (manifest, stats) = self.collect(&channel, bot_id)?;

        let output = expand_path(&config.output);
        manifest.write(&output)?;

        Ok(ImportSummary {
            channel,
            bot_id,
            output,
            stats,
        })
    }

    /// Stream the channel history oldest first and collect unique images.
    ///
    /// The earliest message with a given perceptual hash owns the entry. Undecodable or
    /// undownloadable attachments are skipped; history and session errors abort.
    pub fn collect(&mut self, channel: &Channel, bot_id: i64) -> Result<(Manifest, ImportStats)> {
        let mut manifest = Manifest::new();
        let mut stats = ImportStats::default();

        debug!("Opening history of channel {}", channel.id);
        let history = self.session.history(channel)?;

        for (position, message) in history.enumerate() {
            if self.shutdown.load(Ordering::SeqCst) {
                warn!("Import interrupted after {} messages", stats.examined);
                return Err(Error::Interrupted);
            }

            let message = message?;
            self.progress.checkpoint(position);
            stats.examined += 1;

            if message.media.is_none() {
                continue;
            }
            stats.media += 1;

            if let Some(entry) = self.process(&message, bot_id, &manifest, &mut stats)? {
                manifest.insert(entry);
                stats.entries += 1;
            }
        }

        self.progress.finish(&stats);
        Ok((manifest, stats))
    }

    // Returns the new entry for a first-seen image, None when the message is skipped
    fn process(
        &mut self,
        message: &Message<S::Media>,
        bot_id: i64,
        manifest: &Manifest,
        stats: &mut ImportStats,
    ) -> Result<Option<ImportEntry>> {
        let Some(media) = message.media.as_ref() else {
            return Ok(None);
        };

        let bytes = match self.download(message.id, media) {
            Ok(bytes) => bytes,
            Err(e) if e.is_recoverable() => {
                stats.download_failures += 1;
                self.progress
                    .suspend(|| warn!("Skipping undownloadable media {}: {}", message.id, e));
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let print = match fingerprint(&bytes) {
            Ok(print) => print,
            Err(e) if e.is_recoverable() => {
                stats.non_images += 1;
                self.progress.suspend(|| log_media_skip(message.id, "non-image"));
                debug!("Message {} payload rejected: {}", message.id, e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let perceptual_hash = print.perceptual_hash();
        if manifest.contains(&perceptual_hash) {
            stats.duplicates += 1;
            self.progress.suspend(|| {
                info!(
                    "Duplicate of {} detected in Message {}, skipping it..",
                    perceptual_hash, message.id
                )
            });
            return Ok(None);
        }

        Ok(Some(ImportEntry {
            perceptual_hash,
            content_digest: print.content_digest(),
            bot_id,
            message_id: message.id,
        }))
    }

    fn download(&mut self, message_id: i64, media: &S::Media) -> Result<Vec<u8>> {
        let attempts = self.download_retries + 1;
        let mut attempt = 1;
        loop {
            match self.session.download(media) {
                Ok(bytes) => return Ok(bytes),
                Err(e) if e.is_recoverable() && attempt < attempts => {
                    self.progress
                        .suspend(|| log_download_error(message_id, attempt, attempts, &e));
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
