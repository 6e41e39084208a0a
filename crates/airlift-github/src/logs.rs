//! Run log retrieval
//!
//! The API serves a run's logs as a zip bundle of plain-text files, one per
//! step. The bundle is unpacked in memory; entries that are not valid UTF-8
//! are decoded lossily rather than dropped.

use std::io::{Cursor, Read};

use tracing::{debug, instrument};

use crate::client::HubClient;
use crate::error::{HubError, Result};
use crate::types::RepoRef;

/// One decoded log file from a run's log bundle
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Entry name inside the bundle
    pub name: String,
    /// Decoded text
    pub content: String,
}

impl HubClient {
    /// Download and unpack the log bundle of a workflow run
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn collect_run_logs(&self, repo: &RepoRef, run_id: u64) -> Result<Vec<LogEntry>> {
        let response = self
            .get_absolute(&format!(
                "{}/repos/{}/actions/runs/{}/logs",
                self.base_url(),
                repo.full_name(),
                run_id
            ))
            .await?;
        let bytes = response.bytes().await?;
        debug!(run_id, bytes = bytes.len(), "log bundle downloaded");

        unpack_log_bundle(&bytes)
    }
}

fn unpack_log_bundle(bytes: &[u8]) -> Result<Vec<LogEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| HubError::InvalidLogBundle(e.to_string()))?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| HubError::InvalidLogBundle(e.to_string()))?;
        if entry.is_dir() {
            continue;
        }

        let mut raw = Vec::new();
        entry.read_to_end(&mut raw)?;
        entries.push(LogEntry {
            name: entry.name().to_string(),
            content: String::from_utf8_lossy(&raw).into_owned(),
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn bundle(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in files {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack_log_bundle() {
        let bytes = bundle(&[
            ("build/1_Set up job.txt", b"setup output"),
            ("build/2_Build.txt", b"flutter build output"),
        ]);

        let entries = unpack_log_bundle(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "build/1_Set up job.txt");
        assert_eq!(entries[1].content, "flutter build output");
    }

    #[test]
    fn test_unpack_tolerates_invalid_utf8() {
        let bytes = bundle(&[("step.txt", &[0x66, 0xff, 0x6f][..])]);

        let entries = unpack_log_bundle(&bytes).unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].content.contains('\u{fffd}'));
    }

    #[test]
    fn test_unpack_rejects_garbage() {
        let result = unpack_log_bundle(b"not a zip archive");
        assert!(matches!(result, Err(HubError::InvalidLogBundle(_))));
    }
}
