//! Whole-file JSON persistence.
//!
//! Each data file is the sole source of truth for its records. Every write
//! replaces the whole file; concurrent writers race and the last one wins.

mod repository;

pub use repository::*;

use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;

pub const REQUESTS_FILE: &str = "requests.json";
pub const USERS_FILE: &str = "users.json";
pub const PASSWORDS_FILE: &str = "passwords.json";

/// Reads and writes JSON documents inside a single data directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    data_dir: PathBuf,
}

impl JsonStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path_for(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    async fn ensure_data_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Read `file`, persisting and returning `default` when it does not exist.
    ///
    /// A file that exists but does not parse is a storage error.
    pub async fn read<T>(&self, file: &str, default: T) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned,
    {
        self.ensure_data_dir().await?;
        let path = self.path_for(file);

        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                tracing::error!("Failed to parse {}: {}", path.display(), e);
                AppError::Storage(format!("Failed to parse {}: {}", file, e))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Creating {} with default contents", path.display());
                self.write(file, &default).await?;
                Ok(default)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace `file` with the pretty-printed JSON of `value`.
    ///
    /// Content goes to a sibling temp file unique to this write and is then
    /// renamed into place, so racing writers never share a temp file.
    pub async fn write<T>(&self, file: &str, value: &T) -> Result<(), AppError>
    where
        T: Serialize + ?Sized,
    {
        self.ensure_data_dir().await?;
        let path = self.path_for(file);
        let tmp_path = self.path_for(&format!("{}.{}.tmp", file, uuid::Uuid::new_v4()));

        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::Internal(format!("Failed to serialize {}: {}", file, e)))?;

        tokio::fs::write(&tmp_path, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            tokio::fs::remove_file(&tmp_path).await.ok();
            return Err(e.into());
        }
        Ok(())
    }
}
