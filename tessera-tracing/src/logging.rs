// std
use std::fmt::{Debug, Formatter};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
// crates
use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::Layer;
// internal

pub type FmtLayer<S> = Layer<S, DefaultFields, Format, NonBlocking>;

const DEFAULT_LOG_FILE: &str = "tessera.log";

/// Hourly rolling log files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub prefix: Option<PathBuf>,
}

pub fn create_file_layer<S>(config: FileConfig) -> (FmtLayer<S>, WorkerGuard) {
    let appender = tracing_appender::rolling::hourly(
        config.directory,
        config
            .prefix
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
    );
    create_writer_layer(appender)
}

/// Formats events onto `writer` from a background worker. Pending lines are flushed when the
/// returned guard is dropped.
pub fn create_writer_layer<S, W>(writer: W) -> (FmtLayer<S>, WorkerGuard)
where
    W: Write + Send + 'static,
{
    let (non_blocking, guard) = tracing_appender::non_blocking(writer);
    let layer = Layer::new()
        .with_level(true)
        .with_target(true)
        .with_writer(non_blocking);
    (layer, guard)
}

/// Clonable handle over any writer, so logs can be captured in memory.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<dyn Write + Send + Sync>>,
}

impl SharedWriter {
    pub fn new<W: Write + Send + Sync + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    pub fn from_inner(inner: Arc<Mutex<dyn Write + Send + Sync>>) -> Self {
        Self { inner }
    }
}

impl Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
    }
}

impl Debug for SharedWriter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedWriter").finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_file_layer_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let (layer, guard) = create_file_layer(FileConfig {
            directory: dir.path().to_path_buf(),
            prefix: Some("node.log".into()),
        });
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(height = 3, "Stored headers");
        });
        drop(guard);

        let written: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(written.len(), 1);
        assert!(written[0].starts_with("node.log"));
    }
}
