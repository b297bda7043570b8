// One JSON file treated as a whole-document table.
//
// Every mutation goes through `update`, which holds the document gate across
// load -> mutate -> save, so two callers in this process can never interleave
// inside the same read-modify-write.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

use crate::Error;

pub struct JsonDocument<T> {
    path: PathBuf,
    gate: Mutex<()>,
    _doc: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Default + Serialize + DeserializeOwned + Send,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            gate: Mutex::new(()),
            _doc: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current document. Missing or corrupt files read as `T::default()`.
    pub async fn load(&self) -> T {
        let _guard = self.gate.lock().await;
        self.read_unlocked().await
    }

    /// Replaces the whole document.
    pub async fn save(&self, value: &T) -> Result<(), Error> {
        let _guard = self.gate.lock().await;
        self.write_unlocked(value).await
    }

    /// Atomic read-modify-write. If `f` fails nothing is written.
    pub async fn update<R, F>(&self, f: F) -> Result<R, Error>
    where
        R: Send,
        F: FnOnce(&mut T) -> Result<R, Error> + Send,
    {
        let _guard = self.gate.lock().await;
        let mut doc = self.read_unlocked().await;
        let out = f(&mut doc)?;
        self.write_unlocked(&doc).await?;
        Ok(out)
    }

    async fn read_unlocked(&self) -> T {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet; treating as empty.", self.path.display());
                return T::default();
            }
            Err(e) => {
                warn!("Could not read {}: {e}; treating as empty.", self.path.display());
                return T::default();
            }
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return T::default();
        }

        match serde_json::from_slice(&bytes) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("{} is not valid JSON ({e}); treating as empty.", self.path.display());
                T::default()
            }
        }
    }

    async fn write_unlocked(&self, value: &T) -> Result<(), Error> {
        let body = serde_json::to_vec_pretty(value)?;
        let tmp = self.tmp_path();

        let result = async {
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir).await?;
            }
            tokio::fs::write(&tmp, &body).await?;
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        result.map_err(|e| {
            error!("Failed to write {}: {e}", self.path.display());
            Error::Persistence(format!("writing {}: {e}", self.path.display()))
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
