/// Request-facing layer: validates inputs and delegates to the repository
use std::sync::Arc;
use tracing::{info_span, Instrument, Span};
use video_core::{ResolutionWhitelist, VideoMetadata};

use crate::error::{AppError, Result};
use crate::repository::VideoRepository;

#[derive(Clone)]
pub struct VideoHostingService {
    repo: Arc<VideoRepository>,
    resolutions: Arc<ResolutionWhitelist>,
}

impl VideoHostingService {
    pub fn new(repo: Arc<VideoRepository>, resolutions: ResolutionWhitelist) -> Self {
        Self {
            repo,
            resolutions: Arc::new(resolutions),
        }
    }

    pub async fn get_video_info(&self, parent: &Span, id: &str) -> Result<VideoMetadata> {
        let span = info_span!(parent: parent, "get_video_info", video.id = %id);
        async {
            validate_id(id)?;
            Ok::<_, AppError>(self.repo.get_video_info(&span, id).await?)
        }
        .instrument(span.clone())
        .await
    }

    /// Resolve a playback URL. The resolution tag is checked against the
    /// whitelist before any backend is touched.
    pub async fn get_video_url(&self, parent: &Span, id: &str, resolution: &str) -> Result<String> {
        let span = info_span!(parent: parent, "get_video_url", video.id = %id, video.resolution = %resolution);
        async {
            validate_id(id)?;
            let resolution = self.resolutions.validate(resolution)?;
            Ok::<_, AppError>(self.repo.get_video_url(&span, id, resolution).await?)
        }
        .instrument(span.clone())
        .await
    }
}

fn validate_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppError::ValidationError("video id is required".to_string()));
    }
    Ok(())
}
