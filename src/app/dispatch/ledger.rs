//! Dispatch ledger and remaining-URLs checkpoint

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::DispatchOutcome;
use crate::app::output::{render_lines, write_atomic};
use crate::constants::dispatch;
use crate::errors::{OutputError, OutputResult};

/// Column header of the dispatch ledger
pub const LEDGER_HEADER: [&str; 3] = ["status", "request_url", "outputUrl"];

/// Append-only summary of dispatch outcomes
///
/// Each row is flushed as soon as it is written so that progress survives
/// an interrupted run.
#[derive(Debug)]
pub struct DispatchLedger {
    path: PathBuf,
    file: File,
}

impl DispatchLedger {
    /// Open the ledger for appending, writing the header if the file is new
    pub async fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OutputError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| OutputError::io(path, e))?;

        let is_new = file
            .metadata()
            .await
            .map_err(|e| OutputError::io(path, e))?
            .len()
            == 0;

        let mut ledger = Self {
            path: path.to_path_buf(),
            file,
        };
        if is_new {
            ledger.write_row(LEDGER_HEADER).await?;
        }
        Ok(ledger)
    }

    /// Append one outcome and flush it to disk
    pub async fn append(&mut self, outcome: &DispatchOutcome) -> OutputResult<()> {
        self.write_row([
            outcome.status.as_str(),
            outcome.request_url.as_str(),
            outcome.output_url.as_str(),
        ])
        .await?;
        debug!("Recorded outcome for {}", outcome.request_url);
        Ok(())
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_row(&mut self, fields: [&str; 3]) -> OutputResult<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer
            .write_record(fields)
            .map_err(|e| OutputError::csv(&self.path, e))?;
        writer
            .flush()
            .map_err(|e| OutputError::io(&self.path, e))?;
        let line = writer.get_ref().clone();

        self.file
            .write_all(&line)
            .await
            .map_err(|e| OutputError::io(&self.path, e))?;
        self.file
            .flush()
            .await
            .map_err(|e| OutputError::io(&self.path, e))
    }
}

/// Rewrite the checkpoint with the URLs not yet sent
///
/// Once nothing remains the checkpoint holds a single completion line.
pub async fn write_checkpoint(path: &Path, remaining: &[String]) -> OutputResult<()> {
    let content = if remaining.is_empty() {
        render_lines(&[dispatch::ALL_ATTEMPTED], path)?
    } else {
        render_lines(remaining, path)?
    };
    write_atomic(path, &content).await
}
