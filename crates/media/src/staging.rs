//! Scratch files for in-flight media.
//!
//! Every pipeline run stages the downloaded bytes in a uniquely named temp
//! file. The name comes from a random token chosen by `tempfile`, never from
//! sender-supplied input, and the file is deleted when the handle drops.

use std::path::Path;

use {
    tempfile::{Builder, TempPath},
    tokio::{fs::File, io::AsyncWriteExt},
    tracing::debug,
};

use crate::Result;

const SCRATCH_PREFIX: &str = "mediarelay-";

/// Incrementally writes a download stream into a scratch file.
pub struct StagedWriter {
    file: File,
    path: TempPath,
    len: u64,
}

impl StagedWriter {
    /// Open a fresh scratch file carrying the declared extension hint.
    ///
    /// The extension is cosmetic (it gives the upload a sensible filename);
    /// validation never trusts it.
    pub fn create(extension: &str) -> Result<Self> {
        let named = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(extension)
            .tempfile()?;
        let (file, path) = named.into_parts();
        Ok(Self {
            file: File::from_std(file),
            path,
            len: 0,
        })
    }

    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.file.write_all(chunk).await?;
        self.len += chunk.len() as u64;
        Ok(())
    }

    /// Flush and seal the scratch file into a read-only [`StagedFile`].
    pub async fn finish(mut self) -> Result<StagedFile> {
        self.file.flush().await?;
        debug!(path = %self.path.display(), len = self.len, "staged media file");
        Ok(StagedFile {
            path: self.path,
            len: self.len,
        })
    }
}

/// A downloaded file scoped to one pipeline run.
///
/// Dropping the value removes the backing file, on every exit path
/// including unwinds.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    /// Stage an in-memory payload in one step.
    pub async fn from_bytes(extension: &str, bytes: &[u8]) -> Result<Self> {
        let mut writer = StagedWriter::create(extension)?;
        writer.write_chunk(bytes).await?;
        writer.finish().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The scratch file's name, used as the upload filename.
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("media")
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }
}
