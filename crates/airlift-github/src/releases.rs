//! Release listing and artifact download

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use airlift_core::{EventSink, PipelineEvent};

use crate::client::HubClient;
use crate::error::{HubError, Result};
use crate::types::{Release, ReleaseAsset, RepoRef};

impl HubClient {
    /// The most recent release in the repository
    pub async fn latest_release(&self, repo: &RepoRef) -> Result<Release> {
        let releases: Vec<Release> = self
            .get_json(&format!("/repos/{}/releases", repo.full_name()))
            .await
            .map_err(|e| match e {
                HubError::NotFound(_) => HubError::NoRelease,
                other => other,
            })?;

        releases.into_iter().next().ok_or(HubError::NoRelease)
    }

    /// Download the first asset of the latest release whose name ends with
    /// `extension`, into `dest_dir` (created if missing, overwritten if the
    /// file already exists). Returns the matched asset and the written path.
    #[instrument(skip(self, events), fields(repo = %repo))]
    pub async fn fetch_artifact(
        &self,
        repo: &RepoRef,
        extension: &str,
        dest_dir: &Path,
        events: &dyn EventSink,
    ) -> Result<(ReleaseAsset, PathBuf)> {
        let release = self.latest_release(repo).await?;
        let asset = select_asset(&release.assets, extension)
            .ok_or_else(|| HubError::ArtifactNotFound(extension.to_string()))?
            .clone();

        info!(asset = %asset.name, tag = %release.tag_name, "downloading release asset");
        tokio::fs::create_dir_all(dest_dir).await?;
        let dest_path = dest_dir.join(&asset.name);

        let mut response = self.get_absolute(&asset.browser_download_url).await?;
        let total = response.content_length();
        let mut file = tokio::fs::File::create(&dest_path).await?;
        let mut received: u64 = 0;

        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            received += chunk.len() as u64;
            events.emit(PipelineEvent::DownloadProgress { received, total });
        }
        file.flush().await?;

        info!(path = %dest_path.display(), bytes = received, "artifact written");
        Ok((asset, dest_path))
    }
}

/// First asset whose name ends with `extension`, in listing order
fn select_asset<'a>(assets: &'a [ReleaseAsset], extension: &str) -> Option<&'a ReleaseAsset> {
    assets.iter().find(|asset| asset.name.ends_with(extension))
}
