use futures::TryStreamExt;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use warp::{
    multipart::{FormData, Part},
    Buf,
};

use crate::error::{AnalyticsError, Result};
use crate::process::load_csv;
use crate::store::{DatasetStore, DatasetSummary};

/// Form field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Take the `file` part of a multipart upload, spool it to a temp file, parse
/// it on the blocking pool and cache the rows.
pub async fn ingest_form(form: FormData, store: &DatasetStore) -> Result<DatasetSummary> {
    let mut form = Box::pin(form);
    while let Some(part) = form.try_next().await.map_err(multipart_error)? {
        if part.name() != FILE_FIELD {
            debug!(field = part.name(), "ignoring form field");
            continue;
        }
        let file_name = part.filename().unwrap_or("upload.csv").to_string();

        let (tmp, bytes) = spool(part).await?;
        info!(file_name = %file_name, bytes, "received upload");

        let table = tokio::task::spawn_blocking(move || load_csv(tmp.path()))
            .await
            .map_err(|e| AnalyticsError::ParseFailure(format!("parser task failed: {e}")))??;

        return Ok(store.insert(&file_name, table).await);
    }
    Err(AnalyticsError::MissingParameter(FILE_FIELD.to_string()))
}

/// Stream a part's body to a temp file; returns the file and its size.
async fn spool(part: Part) -> Result<(NamedTempFile, u64)> {
    let mut tmp = NamedTempFile::new()?;
    let mut written = 0u64;

    let mut stream = Box::pin(part.stream());
    while let Some(mut buf) = stream.try_next().await.map_err(multipart_error)? {
        while buf.has_remaining() {
            let chunk = buf.chunk();
            tmp.write_all(chunk)?;
            let len = chunk.len();
            written += len as u64;
            buf.advance(len);
        }
    }
    tmp.flush()?;
    Ok((tmp, written))
}

fn multipart_error(err: warp::Error) -> AnalyticsError {
    AnalyticsError::ParseFailure(format!("multipart stream: {err}"))
}
