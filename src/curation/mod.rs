use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::dataset::{Dataset, DATASET_FILE_NAME};

#[derive(Debug, Error)]
pub enum CurationError {
    #[error("failed to serialize projects: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write export: {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationCheck {
    Allow,
    /// Leaving now discards toggles that were never exported.
    Warn,
}

/// The serialized dataset, ready to be handed to a human for publishing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub contents: String,
}

impl ExportArtifact {
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, CurationError> {
        let path = dir.join(&self.file_name);
        let io_err = |e| CurationError::Write {
            path: path.display().to_string(),
            source: e,
        };
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
        tokio::fs::write(&path, self.contents.as_bytes())
            .await
            .map_err(io_err)?;
        info!(path = %path.display(), bytes = self.contents.len(), "export written");
        Ok(path)
    }
}

pub fn save_notice(artifact_path: &Path, dataset_origin: &str) -> String {
    format!(
        "Changes saved! Replace {dataset_origin} with {} to publish them.",
        artifact_path.display()
    )
}

/// In-memory staff-pick edits over a loaded dataset.
#[derive(Clone, Debug)]
pub struct CurationState {
    dataset: Dataset,
    unsaved: bool,
}

impl CurationState {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            unsaved: false,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Re-flags the state after an export that never reached disk.
    pub fn mark_unsaved(&mut self) {
        self.unsaved = true;
    }

    /// Returns the new flag, or `None` for an unknown id.
    pub fn toggle_staff_pick(&mut self, id: &str) -> Option<bool> {
        let project = self.dataset.get_mut(id)?;
        project.staff_pick = !project.staff_pick;
        self.unsaved = true;
        Some(project.staff_pick)
    }

    /// Pretty-printed `{ "projects": [...] }` of the current state.
    /// Clears the unsaved flag.
    pub fn export(&mut self) -> Result<ExportArtifact, CurationError> {
        let contents = serde_json::to_string_pretty(&self.dataset)
            .map_err(|e| CurationError::Serialize { source: e })?;
        self.unsaved = false;
        Ok(ExportArtifact {
            file_name: DATASET_FILE_NAME.to_string(),
            contents,
        })
    }

    pub fn navigation_check(&self) -> NavigationCheck {
        if self.unsaved {
            NavigationCheck::Warn
        } else {
            NavigationCheck::Allow
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Project;

    fn dataset() -> Dataset {
        Dataset::from_json(
            r#"{"projects":[{"id":"p1","fileName":"a.png","staffPick":false},{"id":"p2","fileName":"b.pdf","staffPick":true}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn toggle_twice_restores_value_but_stays_unsaved() {
        let mut state = CurationState::new(dataset());
        assert_eq!(state.navigation_check(), NavigationCheck::Allow);
        assert_eq!(state.toggle_staff_pick("p1"), Some(true));
        assert_eq!(state.toggle_staff_pick("p1"), Some(false));
        assert!(state.has_unsaved_changes());
        assert_eq!(state.navigation_check(), NavigationCheck::Warn);
    }

    #[test]
    fn unknown_id_changes_nothing() {
        let mut state = CurationState::new(dataset());
        assert_eq!(state.toggle_staff_pick("zz"), None);
        assert!(!state.has_unsaved_changes());
    }

    #[test]
    fn export_round_trips_and_clears_flag() {
        let mut state = CurationState::new(dataset());
        state.toggle_staff_pick("p1");
        let artifact = state.export().unwrap();
        assert!(!state.has_unsaved_changes());
        assert_eq!(artifact.file_name, "projects.json");
        assert!(artifact.contents.contains("\n  \"projects\": ["));

        let parsed = Dataset::from_json(&artifact.contents).unwrap();
        let p1: &Project = parsed.get("p1").unwrap();
        assert!(p1.staff_pick);
        assert_eq!(&parsed, state.dataset());
    }

    #[tokio::test]
    async fn artifact_is_written_into_export_dir() {
        let dir = std::env::temp_dir().join(format!("showcase-export-{}", std::process::id()));
        let mut state = CurationState::new(dataset());
        let artifact = state.export().unwrap();
        let path = artifact.write_to(&dir).await.unwrap();
        assert_eq!(path, dir.join("projects.json"));
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, artifact.contents);
        assert!(save_notice(&path, "./data/projects.json").starts_with("Changes saved!"));
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
