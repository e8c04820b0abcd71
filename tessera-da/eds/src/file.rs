// std
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
// crates
use bytes::Bytes;
use tessera_core::ExtendedDataSquare;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;
// internal
use crate::accessor::{Accessor, AccessorError};

/// Square read from a file written in the node wire format.
#[derive(Debug)]
pub struct FileAccessor {
    path: PathBuf,
    data: Bytes,
    square: Arc<ExtendedDataSquare>,
    closed: AtomicBool,
}

impl FileAccessor {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AccessorError> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).await?;
        let mut contents = vec![];
        file.read_to_end(&mut contents).await?;
        let square: ExtendedDataSquare = tessera_core::wire::deserialize(&contents)?;
        debug!(path = %path.display(), width = square.width(), "Opened square file");
        Ok(Self {
            path,
            data: contents.into(),
            square: Arc::new(square),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), AccessorError> {
        if self.is_closed() {
            return Err(AccessorError::Closed);
        }
        Ok(())
    }
}

impl Accessor for FileAccessor {
    fn reader(&self) -> Result<Box<dyn Read + Send + '_>, AccessorError> {
        self.ensure_open()?;
        Ok(Box::new(Cursor::new(self.data.clone())))
    }

    fn square(&self) -> Result<Arc<ExtendedDataSquare>, AccessorError> {
        self.ensure_open()?;
        Ok(Arc::clone(&self.square))
    }

    fn close(&self) -> Result<(), AccessorError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(AccessorError::Closed);
        }
        debug!(path = %self.path.display(), "Closed square file");
        Ok(())
    }
}
