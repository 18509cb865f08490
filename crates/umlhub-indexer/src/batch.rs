//! Batch ingestion from object-store notifications.
//!
//! A batch is a text object listing one origin URL per line. When the object
//! store announces that such an object was finalized, every listed URL
//! becomes an [`IngestTask`], spaced out in time so the render service is not
//! hit by the whole batch at once. Delivering the tasks (and retrying them) is
//! the [`TaskQueue`]'s business.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Event type announcing a newly written object.
pub const OBJECT_FINALIZE: &str = "OBJECT_FINALIZE";

/// Default spacing between consecutive tasks of one batch.
pub const DEFAULT_TASK_DELAY: Duration = Duration::from_secs(5);

/// Push notification from the object store.
///
/// Shape: `{"message": {"attributes": {"eventType": "...", "objectId": "..."}}}`.
/// Missing parts deserialize as empty, which makes the notification ignorable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Notification {
    #[serde(default)]
    pub message: NotificationMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NotificationMessage {
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Notification {
    pub fn event_type(&self) -> Option<&str> {
        self.attribute("eventType")
    }

    pub fn object_id(&self) -> Option<&str> {
        self.attribute("objectId")
    }

    /// Whether this notification asks for a batch to be processed.
    pub fn is_finalize(&self) -> bool {
        self.event_type() == Some(OBJECT_FINALIZE)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.message.attributes.get(name).map(String::as_str)
    }
}

/// A deferred ingestion of one origin URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestTask {
    pub url: String,
    /// How long to wait before running the task.
    pub delay: Duration,
}

/// Turn a batch listing into tasks.
///
/// Blank lines are skipped. The n-th task (counting from zero) is delayed by
/// `n * spacing`.
pub fn tasks_from_listing(listing: &str, spacing: Duration) -> Vec<IngestTask> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, url)| IngestTask {
            url: url.to_owned(),
            delay: spacing.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)),
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ObjectError {
    #[error("invalid object id: {0}")]
    InvalidId(String),

    #[error("failed to read object {id}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Reads batch objects.
pub trait ObjectSource: Send + Sync {
    /// Read the object `id` as text.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError`] if the id is not acceptable or the read fails.
    fn read(&self, id: &str) -> Result<String, ObjectError>;
}

/// Objects stored as files under a root directory.
///
/// Object ids are relative paths; ids that would escape the root are rejected.
#[derive(Debug, Clone)]
pub struct FsObjectSource {
    root: PathBuf,
}

impl FsObjectSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, id: &str) -> Result<PathBuf, ObjectError> {
        let path = Path::new(id);
        let is_plain = !id.is_empty()
            && path
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !is_plain {
            return Err(ObjectError::InvalidId(id.to_owned()));
        }
        Ok(self.root.join(path))
    }
}

impl ObjectSource for FsObjectSource {
    fn read(&self, id: &str) -> Result<String, ObjectError> {
        let path = self.resolve(id)?;
        std::fs::read_to_string(&path).map_err(|source| ObjectError::Io {
            id: id.to_owned(),
            source,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("task queue is closed")]
    Closed,

    #[error("task queue rejected task: {0}")]
    Rejected(String),
}

/// Accepts ingestion tasks for deferred execution.
pub trait TaskQueue: Send + Sync {
    /// Schedule `task`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] if the task cannot be accepted.
    fn enqueue(&self, task: IngestTask) -> Result<(), QueueError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("finalize notification has no objectId")]
    MissingObjectId,

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl BatchError {
    /// Whether the notification itself was unusable.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingObjectId | Self::Object(ObjectError::InvalidId(_))
        )
    }
}

/// Handle one notification, returning the number of tasks enqueued.
///
/// Notifications other than [`OBJECT_FINALIZE`] are ignored. Tasks enqueued
/// before a queue failure stay enqueued.
///
/// # Errors
///
/// Returns [`BatchError`] if the object id is missing or unreadable, or the
/// queue refuses a task.
pub fn dispatch(
    notification: &Notification,
    objects: &dyn ObjectSource,
    queue: &dyn TaskQueue,
    spacing: Duration,
) -> Result<usize, BatchError> {
    let Some(event_type) = notification.event_type() else {
        tracing::info!("Notification without eventType ignored");
        return Ok(0);
    };
    if !notification.is_finalize() {
        tracing::info!(event_type, "Notification ignored");
        return Ok(0);
    }

    let object_id = notification.object_id().ok_or(BatchError::MissingObjectId)?;
    let listing = objects.read(object_id)?;
    let tasks = tasks_from_listing(&listing, spacing);
    let count = tasks.len();

    for task in tasks {
        tracing::debug!(url = %task.url, delay_secs = task.delay.as_secs(), "Enqueueing ingestion");
        queue.enqueue(task)?;
    }

    tracing::info!(object_id, count, "Batch dispatched");
    Ok(count)
}
