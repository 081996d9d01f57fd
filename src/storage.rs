//! Profile photo storage.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Port for storing uploaded files.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Write `bytes` to `directory/filename`, replacing any existing file.
    async fn store(
        &self,
        directory: &Path,
        filename: &str,
        bytes: &[u8],
    ) -> io::Result<()>;

    /// Remove a previously stored file.
    async fn remove(&self, directory: &Path, filename: &str) -> io::Result<()>;
}

/// Build a collision-resistant name for an uploaded file.
///
/// Clients may send a full path as file name; only its last segment is kept,
/// whether it uses `/` or `\` separators.
pub fn unique_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    format!("{}_{}", uuid::Uuid::new_v4(), base)
}

/// Write `bytes` into `file`, created at `path`. On failure the partial file
/// is removed.
async fn write_or_remove<W>(path: &Path, mut file: W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(bytes).await {
        Ok(()) => file.flush().await,
        Err(err) => Err(err),
    };
    drop(file);

    if let Err(err) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            tracing::error!(path = %path.display(), error = %cleanup, "partial file left on storage");
        }
        return Err(err);
    }

    Ok(())
}

/// Stores files on the local file system.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage;

#[async_trait]
impl FileStorage for LocalStorage {
    async fn store(
        &self,
        directory: &Path,
        filename: &str,
        bytes: &[u8],
    ) -> io::Result<()> {
        fs::create_dir_all(directory).await?;
        let path = directory.join(filename);

        let file = fs::File::create(&path).await?;
        write_or_remove(&path, file, bytes).await?;

        tracing::info!(path = %path.display(), size = bytes.len(), "file stored");
        Ok(())
    }

    async fn remove(&self, directory: &Path, filename: &str) -> io::Result<()> {
        let path = directory.join(filename);
        fs::remove_file(&path).await?;

        tracing::info!(path = %path.display(), "file removed");
        Ok(())
    }
}
