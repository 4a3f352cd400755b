#![allow(dead_code)]

use image::ImageOutputFormat;
use log::{LevelFilter, Log, Metadata, Record};
use std::sync::{Mutex, Once};
use std::thread::{self, ThreadId};

use forwarder_import_core::{Channel, Dialog, Error, Message, Result, Session};

pub use forwarder_import_core::test_utils::{encode, sample_image, FakeBotLogin};

pub fn png(seed: u32) -> Vec<u8> {
    encode(&sample_image(seed), ImageOutputFormat::Png)
}

pub fn bmp(seed: u32) -> Vec<u8> {
    encode(&sample_image(seed), ImageOutputFormat::Bmp)
}

/// Attachment handle handed out by [`FakeSession`]
pub type FakeMedia = usize;

struct Payload {
    bytes: Option<Vec<u8>>,
    failures: u32,
}

/// In-memory session with a scripted dialog list and channel history
#[derive(Default)]
pub struct FakeSession {
    dialogs: Vec<Dialog>,
    messages: Vec<Message<FakeMedia>>,
    payloads: Vec<Payload>,
    broken_after: Option<usize>,
    pub downloads: usize,
    pub histories_opened: usize,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, name: &str, id: i64) -> Self {
        self.dialogs.push(Dialog {
            name: name.to_string(),
            id,
            is_channel: true,
        });
        self
    }

    pub fn group(mut self, name: &str, id: i64) -> Self {
        self.dialogs.push(Dialog {
            name: name.to_string(),
            id,
            is_channel: false,
        });
        self
    }

    /// Message without an attachment
    pub fn text(mut self, id: i64) -> Self {
        self.messages.push(Message { id, media: None });
        self
    }

    /// Message whose attachment downloads to `bytes`
    pub fn media(self, id: i64, bytes: Vec<u8>) -> Self {
        self.flaky_media(id, bytes, 0)
    }

    /// Message whose attachment fails `failures` times before downloading
    pub fn flaky_media(mut self, id: i64, bytes: Vec<u8>, failures: u32) -> Self {
        self.payloads.push(Payload {
            bytes: Some(bytes),
            failures,
        });
        self.messages.push(Message {
            id,
            media: Some(self.payloads.len() - 1),
        });
        self
    }

    /// Message whose attachment never downloads
    pub fn lost_media(mut self, id: i64) -> Self {
        self.payloads.push(Payload {
            bytes: None,
            failures: 0,
        });
        self.messages.push(Message {
            id,
            media: Some(self.payloads.len() - 1),
        });
        self
    }

    /// History yields an error after this many messages
    pub fn broken_after(mut self, count: usize) -> Self {
        self.broken_after = Some(count);
        self
    }
}

impl Session for FakeSession {
    type Media = FakeMedia;
    type History = std::vec::IntoIter<Result<Message<FakeMedia>>>;

    fn dialogs(&mut self) -> Result<Vec<Dialog>> {
        Ok(self.dialogs.clone())
    }

    fn history(&mut self, _channel: &Channel) -> Result<Self::History> {
        self.histories_opened += 1;

        let mut items: Vec<Result<Message<FakeMedia>>> =
            self.messages.iter().cloned().map(Ok).collect();
        if let Some(count) = self.broken_after {
            items.truncate(count);
            items.push(Err(Error::Platform("history fetch failed".to_string())));
        }
        Ok(items.into_iter())
    }

    fn download(&mut self, media: &FakeMedia) -> Result<Vec<u8>> {
        self.downloads += 1;

        let payload = &mut self.payloads[*media];
        if payload.failures > 0 {
            payload.failures -= 1;
            return Err(Error::Download("connection reset".to_string()));
        }
        payload
            .bytes
            .clone()
            .ok_or_else(|| Error::Download("file reference expired".to_string()))
    }
}

/// Route library logs to the test harness
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Logger that keeps every record with the thread that emitted it
struct LogCapture {
    records: Mutex<Vec<(ThreadId, String)>>,
}

impl Log for LogCapture {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((thread::current().id(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static CAPTURE: LogCapture = LogCapture {
    records: Mutex::new(Vec::new()),
};

/// Lines logged after a [`capture_logs`] call by the thread that made it
pub struct CapturedLogs {
    thread: ThreadId,
    start: usize,
}

impl CapturedLogs {
    pub fn lines(&self) -> Vec<String> {
        CAPTURE.records.lock().unwrap()[self.start..]
            .iter()
            .filter(|(thread, _)| *thread == self.thread)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

/// Capture library logs instead of printing them. Not usable alongside
/// [`init_test_logger`] in the same test binary.
pub fn capture_logs() -> CapturedLogs {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
    CapturedLogs {
        thread: thread::current().id(),
        start: CAPTURE.records.lock().unwrap().len(),
    }
}
