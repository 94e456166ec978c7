pub mod media;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use media::{MediaKind, MediaPaths};

/// File name the dataset is published under; the curation export reuses it.
pub const DATASET_FILE_NAME: &str = "projects.json";

/// A single gallery entry.
///
/// Unknown keys are kept in `extra` so an export writes back everything the
/// source carried, not just the fields this crate understands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub project_title: String,
    #[serde(default)]
    pub project_type: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub staff_pick: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Project {
    pub fn author(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_file_name(&self.file_name)
    }
}

/// The `{ "projects": [...] }` document, in display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub projects: Vec<Project>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Dataset {
    pub fn new(projects: Vec<Project>) -> Self {
        Self {
            projects,
            extra: serde_json::Map::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn staff_pick_count(&self) -> usize {
        self.projects.iter().filter(|p| p.staff_pick).count()
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetSource {
    Path(PathBuf),
    Url(String),
}

impl DatasetSource {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(crate::config::expand_tilde(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch dataset: {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("dataset request returned status {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("failed to parse dataset from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Fetches the dataset once per surface.
#[derive(Clone, Debug)]
pub struct DatasetLoader {
    source: DatasetSource,
    client: reqwest::Client,
}

impl DatasetLoader {
    pub fn new(source: DatasetSource, timeout_seconds: u64) -> Result<Self, DatasetError> {
        let client = crate::utils::build_http_client(timeout_seconds, None)
            .map_err(|e| DatasetError::HttpClientBuild { source: e })?;
        Ok(Self { source, client })
    }

    pub fn with_client(source: DatasetSource, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    pub fn source(&self) -> &DatasetSource {
        &self.source
    }

    pub async fn load(&self) -> Result<Dataset, DatasetError> {
        let origin = self.source.describe();
        debug!(source = %origin, "loading dataset");
        let raw = match &self.source {
            DatasetSource::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| DatasetError::FileRead {
                        path: origin.clone(),
                        source: e,
                    })?
            }
            DatasetSource::Url(url) => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| DatasetError::Fetch {
                        url: url.clone(),
                        source: e,
                    })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(DatasetError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                response.text().await.map_err(|e| DatasetError::Fetch {
                    url: url.clone(),
                    source: e,
                })?
            }
        };
        let dataset =
            Dataset::from_json(&raw).map_err(|e| DatasetError::Parse { origin, source: e })?;
        debug!(projects = dataset.len(), "dataset loaded");
        Ok(dataset)
    }
}

/// Where a surface is in its one-shot dataset load.
///
/// `Ready` with zero projects is a real, empty gallery; `NotLoaded` and
/// `Failed` mean there is nothing to filter or render yet.
#[derive(Clone, Debug, Default)]
pub enum DatasetState {
    #[default]
    NotLoaded,
    Failed(String),
    Ready(Dataset),
}

impl DatasetState {
    pub async fn load(loader: &DatasetLoader) -> Self {
        match loader.load().await {
            Ok(dataset) => Self::Ready(dataset),
            Err(e) => {
                tracing::error!(error = %e, "error loading projects");
                Self::Failed(e.to_string())
            }
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "projects": [
            {
                "id": "p1",
                "firstName": "Ada",
                "lastName": "Lovelace",
                "projectTitle": "Engines",
                "projectType": "Poster",
                "category": "Science",
                "year": "2024",
                "fileName": "engines.PDF",
                "staffPick": false,
                "advisor": "Babbage"
            },
            { "id": "p2", "fileName": "photo.jpg" }
        ],
        "generatedBy": "hand"
    }"#;

    #[test]
    fn parses_projects_and_keeps_unknown_keys() {
        let dataset = Dataset::from_json(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 2);
        let p1 = dataset.get("p1").unwrap();
        assert_eq!(p1.author(), "Ada Lovelace");
        assert_eq!(p1.media_kind(), MediaKind::Document);
        assert_eq!(p1.extra.get("advisor").unwrap(), "Babbage");
        assert_eq!(dataset.extra.get("generatedBy").unwrap(), "hand");

        let p2 = dataset.get("p2").unwrap();
        assert!(!p2.staff_pick);
        assert_eq!(p2.media_kind(), MediaKind::Image);
    }

    #[test]
    fn source_parse_distinguishes_urls() {
        assert_eq!(
            DatasetSource::parse("https://example.com/data/projects.json"),
            DatasetSource::Url("https://example.com/data/projects.json".to_string())
        );
        assert_eq!(
            DatasetSource::parse("./data/projects.json"),
            DatasetSource::Path(PathBuf::from("./data/projects.json"))
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_failed_state() {
        let loader = DatasetLoader::new(
            DatasetSource::Path(PathBuf::from("/nonexistent/showcase/projects.json")),
            5,
        )
        .unwrap();
        let state = DatasetState::load(&loader).await;
        assert!(matches!(state, DatasetState::Failed(_)));
        assert!(state.dataset().is_none());
    }

    #[tokio::test]
    async fn loads_from_file() {
        let path = std::env::temp_dir().join(format!(
            "showcase-dataset-{}-{}.json",
            std::process::id(),
            "loads_from_file"
        ));
        tokio::fs::write(&path, SAMPLE).await.unwrap();
        let loader = DatasetLoader::new(DatasetSource::Path(path.clone()), 5).unwrap();
        let dataset = loader.load().await.unwrap();
        assert_eq!(dataset.staff_pick_count(), 0);
        let _ = tokio::fs::remove_file(&path).await;
    }
}
