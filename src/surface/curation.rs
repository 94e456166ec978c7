use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use indicatif::ProgressBar;

use super::{Flow, Surface, UiEvent, LOAD_ERROR_MESSAGE};
use crate::counter::ViewCounter;
use crate::curation::{save_notice, CurationState, NavigationCheck};
use crate::dataset::{DatasetState, MediaPaths};
use crate::output::render::{self, TableRow};

pub const UNSAVED_WARNING: &str =
    "You have unsaved changes. Leave again to discard them, or save first.";
pub const DISCARDED_WARNING: &str = "Unsaved changes were discarded. Save before leaving to keep them.";

/// Staff-pick administration table.
pub struct CurationSurface {
    curation: Option<CurationState>,
    counter: ViewCounter,
    paths: MediaPaths,
    export_dir: PathBuf,
    dataset_origin: String,
    views: HashMap<String, u64>,
    leave_warned: bool,
    progress: ProgressBar,
}

impl CurationSurface {
    pub fn new(
        state: DatasetState,
        counter: ViewCounter,
        paths: MediaPaths,
        export_dir: PathBuf,
        dataset_origin: impl Into<String>,
    ) -> Self {
        let curation = match state {
            DatasetState::Ready(dataset) => Some(CurationState::new(dataset)),
            _ => None,
        };
        Self {
            curation,
            counter,
            paths,
            export_dir,
            dataset_origin: dataset_origin.into(),
            views: HashMap::new(),
            leave_warned: false,
            progress: ProgressBar::hidden(),
        }
    }

    /// Ticks once per counter read during [`Surface::start`].
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> Option<&CurationState> {
        self.curation.as_ref()
    }

    pub fn views(&self, id: &str) -> Option<u64> {
        self.views.get(id).copied()
    }

    async fn load_views(&mut self) {
        let Some(curation) = self.curation.as_ref() else {
            return;
        };
        let ids: Vec<String> = curation
            .dataset()
            .projects
            .iter()
            .map(|p| p.id.clone())
            .collect();
        self.progress.set_length(ids.len() as u64);

        // a failed read shows as zero; the warning is already logged
        for id in ids {
            let reading = self.counter.read_counter(&id).await;
            self.views.insert(id, reading.or_zero());
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();
    }

    async fn save(&mut self) -> String {
        let Some(curation) = self.curation.as_mut() else {
            return render::warning(LOAD_ERROR_MESSAGE);
        };
        let artifact = match curation.export() {
            Ok(a) => a,
            Err(e) => return render::warning(&e.to_string()),
        };
        match artifact.write_to(&self.export_dir).await {
            Ok(path) => render::notice(&save_notice(&path, &self.dataset_origin)),
            Err(e) => {
                curation.mark_unsaved();
                tracing::error!(error = %e, "export failed");
                render::warning(&e.to_string())
            }
        }
    }
}

#[async_trait]
impl Surface for CurationSurface {
    fn name(&self) -> &'static str {
        "curate"
    }

    async fn start(&mut self) -> Vec<String> {
        self.load_views().await;
        Vec::new()
    }

    async fn handle(&mut self, event: UiEvent) -> (Flow, Vec<String>) {
        if event != UiEvent::NavigateAway {
            self.leave_warned = false;
        }
        let mut notices = Vec::new();
        match event {
            UiEvent::ToggleStaffPick(id) => {
                let toggled = self
                    .curation
                    .as_mut()
                    .and_then(|c| c.toggle_staff_pick(&id));
                match toggled {
                    Some(now) => {
                        tracing::info!(project = %id, staff_pick = now, "staff pick toggled");
                    }
                    None => notices.push(render::warning(&format!("no project with id '{id}'"))),
                }
            }
            UiEvent::SaveChanges => notices.push(self.save().await),
            UiEvent::NavigateAway => {
                let check = self
                    .curation
                    .as_ref()
                    .map(|c| c.navigation_check())
                    .unwrap_or(NavigationCheck::Allow);
                if check == NavigationCheck::Warn && !self.leave_warned {
                    self.leave_warned = true;
                    notices.push(render::warning(UNSAVED_WARNING));
                    return (Flow::Continue, notices);
                }
                return (Flow::Leave, notices);
            }
            other => notices.push(render::warning(&format!(
                "not available on this page: {other:?}"
            ))),
        }
        (Flow::Continue, notices)
    }

    async fn input_closed(&mut self) -> Vec<String> {
        let unsaved = self
            .curation
            .as_ref()
            .map(|c| c.navigation_check() == NavigationCheck::Warn)
            .unwrap_or(false);
        if !unsaved {
            return Vec::new();
        }
        tracing::warn!("input ended with unsaved staff-pick changes");
        vec![render::warning(DISCARDED_WARNING)]
    }

    fn render(&self) -> String {
        let Some(curation) = self.curation.as_ref() else {
            return LOAD_ERROR_MESSAGE.to_string();
        };
        let rows: Vec<TableRow<'_>> = curation
            .dataset()
            .projects
            .iter()
            .map(|p| TableRow {
                project: p,
                views: self.views(&p.id).unwrap_or(0),
            })
            .collect();
        let mut out = render::table(&rows, &self.paths);
        out.push_str("\n\n");
        if curation.has_unsaved_changes() {
            out.push_str(&render::warning("unsaved changes"));
        } else {
            out.push_str(&render::notice("no unsaved changes"));
        }
        out
    }
}
