//! Flat on-disk store for uploaded and converted meshes
//!
//! Filenames are storage keys used verbatim; the only restriction is that a key must
//! name an entry directly inside its directory.

use std::{
    io,
    path::{Path, PathBuf},
};

use tokio::fs;

#[derive(Debug, Clone)]
pub struct FileStore {
    upload_dir: PathBuf,
    converted_dir: PathBuf,
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>, converted_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            converted_dir: converted_dir.into(),
        }
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn converted_dir(&self) -> &Path {
        &self.converted_dir
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(&self.upload_dir).await?;
        fs::create_dir_all(&self.converted_dir).await
    }

    pub fn upload_path(&self, filename: &str) -> Option<PathBuf> {
        is_safe_filename(filename).then(|| self.upload_dir.join(filename))
    }

    pub fn converted_path(&self, filename: &str) -> Option<PathBuf> {
        is_safe_filename(filename).then(|| self.converted_dir.join(filename))
    }

    /// Finds a stored file, preferring the upload directory over converted outputs.
    pub async fn locate(&self, filename: &str) -> Option<PathBuf> {
        if let Some(path) = self.source(filename).await {
            return Some(path);
        }
        existing_file(self.converted_path(filename)?).await
    }

    /// Finds a conversion source. Only uploads qualify.
    pub async fn source(&self, filename: &str) -> Option<PathBuf> {
        existing_file(self.upload_path(filename)?).await
    }

    /// Opens `filename` in the upload directory for writing, truncating any previous
    /// upload with the same name.
    pub async fn create_upload(&self, filename: &str) -> io::Result<(PathBuf, fs::File)> {
        let path = self.upload_path(filename).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsafe filename: {filename:?}"),
            )
        })?;
        let file = fs::File::create(&path).await?;
        Ok((path, file))
    }
}

/// A key is safe when it names a single entry: non-empty, not `.`/`..`, and free of
/// path separators and NUL.
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\', '\0'])
}

async fn existing_file(path: PathBuf) -> Option<PathBuf> {
    match fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => Some(path),
        _ => None,
    }
}
