//! Coalescing speech queue

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::Result;

/// Speech playback primitive
///
/// `speak` resolves when playback has completed. Errors are logged by the
/// announcer and never reach the code that requested the announcement.
#[async_trait::async_trait]
pub trait Speaker: Send + Sync + 'static {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speaker that only writes announcements to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSpeaker;

#[async_trait::async_trait]
impl Speaker for LogSpeaker {
    async fn speak(&self, text: &str) -> Result<()> {
        info!(text, "Announcement");
        Ok(())
    }
}

/// Single-slot mailbox shared between handles and the playback worker.
#[derive(Debug, Default)]
struct Mailbox {
    slot: Mutex<Option<String>>,
    notify: Notify,
}

impl Mailbox {
    fn put(&self, text: String) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).replace(text)
    }

    fn take(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

#[derive(Debug)]
struct Inner {
    mailbox: Arc<Mailbox>,
    cancel: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        debug!("Dropping announcer");
        self.cancel.cancel();
    }
}

/// Non-overlapping, last-wins announcement queue
///
/// At most one announcement plays at a time. Requests made while playback
/// is busy (or before the worker got to run) overwrite each other, so when
/// the speaker frees up only the most recent request is spoken and the
/// superseded ones are dropped.
///
/// The announcer is process wide: cloned handles share one worker, and it
/// outlives race sessions. The worker stops when the last handle is dropped
/// or on [`Announcer::shutdown`].
#[derive(Debug, Clone)]
pub struct Announcer {
    inner: Arc<Inner>,
}

impl Announcer {
    /// Spawn the playback worker. Must be called within a tokio runtime.
    pub fn spawn<S: Speaker>(speaker: S) -> Self {
        let mailbox = Arc::new(Mailbox::default());
        let cancel = CancellationToken::new();

        let worker_mailbox = Arc::clone(&mailbox);
        let worker_cancel = cancel.clone();
        tokio::spawn(async move {
            Self::playback_task(speaker, worker_mailbox, worker_cancel).await;
        });

        Self { inner: Arc::new(Inner { mailbox, cancel }) }
    }

    /// Request an announcement. Never blocks and never fails.
    pub fn enqueue(&self, text: impl Into<String>) {
        let text = text.into();
        if self.inner.cancel.is_cancelled() {
            debug!(text, "Announcer stopped, dropping announcement");
            return;
        }
        if let Some(superseded) = self.inner.mailbox.put(text) {
            debug!(text = superseded, "Speech cancelled");
        }
        self.inner.mailbox.notify.notify_one();
    }

    /// Stop the playback worker; later requests are dropped.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled()
    }

    async fn playback_task<S: Speaker>(
        speaker: S,
        mailbox: Arc<Mailbox>,
        cancel: CancellationToken,
    ) {
        debug!("Announcer started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = mailbox.notify.notified() => {}
            }

            // A wake-up can outlive the request it announced.
            let Some(text) = mailbox.take() else { continue };

            debug!(text, "Speak");
            let result = tokio::select! {
                _ = cancel.cancelled() => break,
                result = speaker.speak(&text) => result,
            };
            if let Err(e) = result {
                error!("Speech error: {}", e);
            }
        }
        debug!("Announcer stopped");
    }
}
