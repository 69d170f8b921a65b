use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::{Collection, Record};
use crate::error::{Result, StoreError};

/// One collection stored as a pretty-printed JSON array in a single file.
///
/// Writes go to a temporary file in the same directory which is synced and
/// then renamed over the target, so the file on disk is always either the
/// old or the new array.
pub struct JsonCollection<R> {
    path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R> JsonCollection<R> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl<R> Collection<R> for JsonCollection<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    fn load(&self) -> Result<Vec<R>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::storage(R::KIND, e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&bytes).map_err(|e| StoreError::storage(R::KIND, e))
    }

    fn save(&mut self, records: &[R]) -> Result<()> {
        let fail = |e: std::io::Error| StoreError::storage(R::KIND, e);
        let dir = self.dir();
        std::fs::create_dir_all(dir).map_err(fail)?;

        let body =
            serde_json::to_vec_pretty(records).map_err(|e| StoreError::storage(R::KIND, e))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(fail)?;
        tmp.write_all(&body).map_err(fail)?;
        tmp.as_file().sync_all().map_err(fail)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::storage(R::KIND, e))?;

        tracing::trace!(path = %self.path.display(), count = records.len(), "saved collection");
        Ok(())
    }
}
