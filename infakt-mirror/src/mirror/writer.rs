use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::io::AsyncWriteExt;

use super::error::{MirrorError, io_err};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    Unchanged,
}

pub fn render_json(value: &Value) -> Result<String, MirrorError> {
    let mut rendered = serde_json::to_string_pretty(value)?;
    rendered.push('\n');
    Ok(rendered)
}

pub async fn write_json_if_changed(path: &Path, value: &Value) -> Result<WriteResult, MirrorError> {
    let rendered = render_json(value)?;
    match tokio::fs::read(path).await {
        Ok(existing) if existing == rendered.as_bytes() => return Ok(WriteResult::Unchanged),
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(io_err(path, err)),
    }

    write_atomic(path, rendered.as_bytes()).await?;
    Ok(WriteResult::Written)
}

pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), MirrorError> {
    let partial = partial_path(path);
    let mut file = tokio::fs::File::create(&partial)
        .await
        .map_err(|err| io_err(&partial, err))?;
    file.write_all(bytes)
        .await
        .map_err(|err| io_err(&partial, err))?;
    file.flush().await.map_err(|err| io_err(&partial, err))?;
    file.sync_all().await.map_err(|err| io_err(&partial, err))?;
    drop(file);

    tokio::fs::rename(&partial, path)
        .await
        .map_err(|err| io_err(path, err))
}

// The partial name carries no "<digits>." sequence, so an interrupted write
// is never mistaken for an archive slot.
fn partial_path(target: &Path) -> PathBuf {
    target.with_file_name(".write.partial")
}
