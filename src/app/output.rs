//! On-disk CSV snapshots
//!
//! Every snapshot is rendered in memory and written with the temp file +
//! rename pattern, so a reader never sees a half-written file. The dispatch
//! ledger is the one incremental file and lives with the dispatcher.

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::fs;
use tracing::{debug, error, info};

use crate::app::models::ComparisonRow;
use crate::constants::files;
use crate::errors::{OutputError, OutputResult};

/// Suffix of the temporary file a snapshot is written to before renaming
const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Column header of the comparison snapshot
pub const COMPARISON_HEADER: [&str; 14] = [
    "array_name",
    "array_code",
    "subsite",
    "node",
    "sensor",
    "reference_designator",
    "method",
    "stream_name",
    "stream_type",
    "in_qcdb",
    "beginTime",
    "endTime",
    "in_gui_catalog",
    "source",
];

/// Local time stamp identifying one run, e.g. `20180109T1432`
pub fn run_stamp() -> String {
    Local::now().format(files::RUN_STAMP_FORMAT).to_string()
}

/// Paths of every file one run writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub comparison: PathBuf,
    pub request_urls: PathBuf,
    pub summary: PathBuf,
    pub not_sent: PathBuf,
}

impl OutputPaths {
    /// Paths under `directory` for the run identified by `stamp`
    pub fn new(directory: &Path, stamp: &str) -> Self {
        let path = |prefix: &str| directory.join(format!("{}_{}.csv", prefix, stamp));
        Self {
            comparison: path(files::COMPARISON_PREFIX),
            request_urls: path(files::REQUEST_URLS_PREFIX),
            summary: path(files::SUMMARY_PREFIX),
            not_sent: path(files::NOT_SENT_PREFIX),
        }
    }

    /// Paths for dispatching an existing URL list
    ///
    /// The ledger and checkpoint reuse the list's run stamp when its name has
    /// one, so they sit next to the files they describe.
    pub fn for_url_list(urls: &Path, output_directory: &Path) -> Self {
        let stamp = urls
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.strip_prefix(files::REQUEST_URLS_PREFIX))
            .and_then(|s| s.strip_prefix('_'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(run_stamp);

        let mut paths = Self::new(output_directory, &stamp);
        paths.request_urls = urls.to_path_buf();
        paths
    }
}

fn flag(present: bool) -> &'static str {
    if present {
        "yes"
    } else {
        ""
    }
}

/// Render the comparison table as CSV
pub fn render_comparison(rows: &[ComparisonRow], path: &Path) -> OutputResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COMPARISON_HEADER)
        .map_err(|e| OutputError::csv(path, e))?;

    for row in rows {
        let r = &row.record;
        let d = &r.designator;
        writer
            .write_record([
                r.array_name.as_deref().unwrap_or(""),
                d.array_code.as_str(),
                d.subsite.as_str(),
                d.node.as_str(),
                d.sensor.as_str(),
                d.full.as_str(),
                r.method.as_str(),
                r.stream_name.as_str(),
                r.stream_type.as_deref().unwrap_or(""),
                flag(r.in_qcdb),
                r.begin_time.as_deref().unwrap_or(""),
                r.end_time.as_deref().unwrap_or(""),
                flag(r.in_catalog),
                row.source.label(),
            ])
            .map_err(|e| OutputError::csv(path, e))?;
    }

    into_bytes(writer, path)
}

/// Render single-column lines without a header
pub fn render_lines<S: AsRef<str>>(lines: &[S], path: &Path) -> OutputResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for line in lines {
        writer
            .write_record([line.as_ref()])
            .map_err(|e| OutputError::csv(path, e))?;
    }
    into_bytes(writer, path)
}

fn into_bytes(writer: csv::Writer<Vec<u8>>, path: &Path) -> OutputResult<Vec<u8>> {
    writer.into_inner().map_err(|e| {
        let error = e.error();
        OutputError::io(path, std::io::Error::new(error.kind(), error.to_string()))
    })
}

/// Write the comparison snapshot
pub async fn write_comparison(path: &Path, rows: &[ComparisonRow]) -> OutputResult<()> {
    let content = render_comparison(rows, path)?;
    write_atomic(path, &content).await?;
    info!("Wrote {} comparison rows to {}", rows.len(), path.display());
    Ok(())
}

/// Write one request URL per line, no header
pub async fn write_url_list(path: &Path, urls: &[String]) -> OutputResult<()> {
    let content = render_lines(urls, path)?;
    write_atomic(path, &content).await?;
    info!("Wrote {} request URLs to {}", urls.len(), path.display());
    Ok(())
}

/// Read a URL list written by [`write_url_list`]
///
/// Blank lines are skipped.
pub async fn read_url_list(path: &Path) -> OutputResult<Vec<String>> {
    let content = fs::read(path)
        .await
        .map_err(|e| OutputError::io(path, e))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_slice());

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| OutputError::csv(path, e))?;
        if let Some(url) = record.get(0).map(str::trim).filter(|u| !u.is_empty()) {
            urls.push(url.to_string());
        }
    }

    debug!("Read {} request URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Write content atomically using temp file + rename
pub async fn write_atomic(path: &Path, content: &[u8]) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| OutputError::io(parent, e))?;
    }

    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(TEMP_FILE_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, content)
        .await
        .map_err(|e| OutputError::io(&temp_path, e))?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        error!("Failed to rename temporary file: {}", e);
        let _ = fs::remove_file(&temp_path).await;
        return Err(OutputError::AtomicOperationFailed {
            final_path: path.to_path_buf(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::fixtures::qcdb_record;
    use crate::app::models::StreamSource;
    use tempfile::TempDir;

    #[test]
    fn test_output_paths_share_run_stamp() {
        let paths = OutputPaths::new(Path::new("/data"), "20180109T1432");
        assert_eq!(
            paths.comparison,
            PathBuf::from("/data/compare_qcdb_gui_catalog_20180109T1432.csv")
        );
        assert_eq!(
            paths.request_urls,
            PathBuf::from("/data/data_request_urls_20180109T1432.csv")
        );
        assert_eq!(
            paths.summary,
            PathBuf::from("/data/data_request_summary_20180109T1432.csv")
        );
        assert_eq!(
            paths.not_sent,
            PathBuf::from("/data/urls_not_sent_20180109T1432.csv")
        );
    }

    #[test]
    fn test_paths_for_url_list_reuse_stamp() {
        let urls = Path::new("/data/data_request_urls_20180109T1432.csv");
        let paths = OutputPaths::for_url_list(urls, Path::new("/out"));
        assert_eq!(paths.request_urls, urls);
        assert_eq!(
            paths.summary,
            PathBuf::from("/out/data_request_summary_20180109T1432.csv")
        );
    }

    #[test]
    fn test_run_stamp_format() {
        let stamp = run_stamp();
        assert_eq!(stamp.len(), 13);
        assert_eq!(&stamp[8..9], "T");
    }

    #[test]
    fn test_render_comparison_columns() {
        let row = ComparisonRow {
            record: qcdb_record("GI01SUMO-SBD11-01-FLORTD000", "recovered_host", "flort_sample", "Science"),
            source: StreamSource::QcDatabaseOnly,
        };
        let bytes = render_comparison(&[row], Path::new("compare.csv")).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], COMPARISON_HEADER.join(","));
        assert_eq!(
            lines[1],
            ",GI,GI01SUMO,SBD11,01-FLORTD000,GI01SUMO-SBD11-01-FLORTD000,recovered_host,flort_sample,Science,yes,,,,qcdb_only"
        );
    }

    #[tokio::test]
    async fn test_url_list_written_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data_request_urls_20180109T1432.csv");
        let urls = vec![
            "https://ooinet.oceanobservatories.org/a?beginDT=x&endDT=y".to_string(),
            "https://ooinet.oceanobservatories.org/b?beginDT=x&endDT=y".to_string(),
        ];

        write_url_list(&path, &urls).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert_eq!(read_url_list(&path).await.unwrap(), urls);
    }

    #[tokio::test]
    async fn test_atomic_write_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("out.csv");

        write_atomic(&path, b"first\n").await.unwrap();
        write_atomic(&path, b"second\n").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\n");
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
    }
}
