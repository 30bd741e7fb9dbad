//! Thread configuration applied before the native thread is created.

use super::handle::Thread;
use crate::error::ThreadResult;

/// Configures a [`Thread`] before spawning it.
///
/// ```no_run
/// use mthread::Builder;
///
/// let mut worker = Builder::new()
///     .name("indexer")
///     .stack_size(256 * 1024)
///     .spawn(|| println!("indexing"))?;
/// worker.join()?;
/// # Ok::<(), mthread::ThreadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    name: Option<String>,
    stack_size: Option<usize>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display name of the thread. An empty name becomes `"UNKNOWN"`, in
    /// creation errors too.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Stack size in bytes. The platform default is used when unset; values
    /// the OS rejects make [`spawn`](Builder::spawn) fail.
    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = Some(size);
        self
    }

    /// Spawn the configured thread and wait for its startup handshake.
    pub fn spawn<F>(self, f: F) -> ThreadResult<Thread>
    where
        F: FnOnce() + Send + 'static,
    {
        Thread::spawn_boxed(self.name.unwrap_or_default(), self.stack_size, Box::new(f))
    }
}
