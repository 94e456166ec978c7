use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::StreamExt;

use super::{
    views_text, Flow, Fragments, Surface, UiEvent, LOADING_GRID, LOADING_VIEWS, LOAD_ERROR_MESSAGE,
};
use crate::counter::{CounterReading, ViewCounter};
use crate::dataset::{DatasetState, MediaPaths, Project};
use crate::filter::{self, Facets, FilterCriteria};
use crate::output::{self, render, OutputRecord};

pub const NO_MATCHES_MESSAGE: &str = "No projects match your filters.";

fn grid_element(id: &str) -> String {
    format!("gallery-view-{id}")
}

fn modal_element(id: &str) -> String {
    format!("modal-view-{id}")
}

/// Browse-all page: filterable grid plus a detail overlay.
pub struct GallerySurface {
    state: DatasetState,
    counter: ViewCounter,
    paths: MediaPaths,
    criteria: FilterCriteria,
    visible: Vec<usize>,
    open: Option<String>,
    readings: HashMap<String, CounterReading>,
    fragments: Fragments,
}

impl GallerySurface {
    pub fn new(state: DatasetState, counter: ViewCounter, paths: MediaPaths) -> Self {
        let visible = match state.dataset() {
            Some(d) => (0..d.len()).collect(),
            None => Vec::new(),
        };
        Self {
            state,
            counter,
            paths,
            criteria: FilterCriteria::default(),
            visible,
            open: None,
            readings: HashMap::new(),
            fragments: Fragments::default(),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Starts from `criteria` instead of an empty filter.
    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        if let Some(d) = self.state.dataset() {
            self.visible = filter::matching_indices(&d.projects, &self.criteria);
        }
        self
    }

    /// `None` until the dataset has loaded; `Some(empty)` when nothing matches.
    pub fn visible_projects(&self) -> Option<Vec<&Project>> {
        let dataset = self.state.dataset()?;
        Some(
            self.visible
                .iter()
                .filter_map(|&i| dataset.projects.get(i))
                .collect(),
        )
    }

    pub fn facets(&self) -> Option<Facets> {
        self.state.dataset().map(|d| Facets::collect(&d.projects))
    }

    pub fn open_project_id(&self) -> Option<&str> {
        self.open.as_deref()
    }

    pub fn grid_views(&self, id: &str) -> Option<&str> {
        self.fragments.get(&grid_element(id))
    }

    pub fn modal_views(&self, id: &str) -> Option<&str> {
        self.fragments.get(&modal_element(id))
    }

    pub fn results_summary(&self) -> String {
        let total = self.state.dataset().map(|d| d.len()).unwrap_or(0);
        filter::results_summary(self.visible.len(), total)
    }

    pub fn records(&self) -> Vec<OutputRecord> {
        let visible = self.visible_projects().unwrap_or_default();
        output::build_records(
            visible
                .into_iter()
                .map(|p| (p, self.readings.get(&p.id).copied())),
            &self.paths,
        )
    }

    /// Re-evaluates the filter and re-reads the counters of what is shown.
    pub async fn apply_filters(&mut self) {
        let Some(dataset) = self.state.dataset() else {
            return;
        };
        self.visible = filter::matching_indices(&dataset.projects, &self.criteria);
        self.display_gallery().await;
    }

    pub async fn clear_filters(&mut self) {
        self.criteria.clear();
        self.apply_filters().await;
    }

    /// Replaces the grid fragments with placeholders for the visible projects
    /// and returns their ids.
    fn reset_grid(&mut self) -> Vec<String> {
        let Some(dataset) = self.state.dataset() else {
            return Vec::new();
        };
        let ids: Vec<String> = self
            .visible
            .iter()
            .filter_map(|&i| dataset.projects.get(i))
            .map(|p| p.id.clone())
            .collect();

        self.fragments.remove_prefixed("gallery-view-");
        for id in ids.iter() {
            self.fragments.insert(grid_element(id), LOADING_GRID);
        }
        ids
    }

    async fn display_gallery(&mut self) {
        let ids = self.reset_grid();
        let mut pending = FuturesUnordered::new();
        for id in ids {
            let counter = self.counter.clone();
            pending.push(async move {
                let reading = counter.read_counter(&id).await;
                (id, reading)
            });
        }
        while let Some((id, reading)) = pending.next().await {
            if self.fragments.update_if_present(&grid_element(&id), views_text(reading)) {
                self.readings.insert(id, reading);
            }
        }
    }

    /// Shows the overlay for `id` and counts the view. `None` for an unknown id.
    pub async fn open_project(&mut self, id: &str) -> Option<CounterReading> {
        self.state.dataset()?.get(id)?;
        if let Some(prev) = self.open.take() {
            self.fragments.remove(&modal_element(&prev));
        }
        self.open = Some(id.to_string());
        self.fragments.insert(modal_element(id), LOADING_VIEWS);

        let reading = self.counter.increment_counter(id).await;
        if let CounterReading::Count(_) = reading {
            let text = views_text(reading);
            self.fragments.update_if_present(&modal_element(id), text.clone());
            if self.fragments.update_if_present(&grid_element(id), text) {
                self.readings.insert(id.to_string(), reading);
            }
        }
        Some(reading)
    }

    pub fn close_project(&mut self) {
        if let Some(prev) = self.open.take() {
            self.fragments.remove(&modal_element(&prev));
        }
    }
}

#[async_trait]
impl Surface for GallerySurface {
    fn name(&self) -> &'static str {
        "gallery"
    }

    async fn start(&mut self) -> Vec<String> {
        self.display_gallery().await;
        Vec::new()
    }

    async fn handle(&mut self, event: UiEvent) -> (Flow, Vec<String>) {
        let mut notices = Vec::new();
        match event {
            UiEvent::SearchChanged(term) => {
                self.criteria.search = term;
                self.apply_filters().await;
            }
            UiEvent::FilterChanged(field, value) => match self.criteria.set(field, &value) {
                Ok(()) => self.apply_filters().await,
                Err(e) => notices.push(render::warning(&e)),
            },
            UiEvent::ClearFilters => self.clear_filters().await,
            UiEvent::OpenProject(id) => {
                if self.open_project(&id).await.is_none() {
                    notices.push(render::warning(&format!("no project with id '{id}'")));
                }
            }
            UiEvent::CloseProject => self.close_project(),
            UiEvent::NavigateAway => return (Flow::Leave, notices),
            other => notices.push(render::warning(&format!(
                "not available on this page: {other:?}"
            ))),
        }
        (Flow::Continue, notices)
    }

    fn render(&self) -> String {
        let Some(projects) = self.visible_projects() else {
            return LOAD_ERROR_MESSAGE.to_string();
        };
        let mut out = String::new();
        out.push_str(&render::heading(&self.results_summary()));
        out.push('\n');
        if let Some(facets) = self.facets() {
            out.push_str(&render::facets(&facets));
            out.push_str("\n\n");
        }
        if projects.is_empty() {
            out.push_str(NO_MATCHES_MESSAGE);
        } else {
            let lines: Vec<String> = projects
                .iter()
                .map(|p| {
                    let views = self.grid_views(&p.id).unwrap_or_default();
                    render::grid_entry(p, &self.paths, views)
                })
                .collect();
            out.push_str(&lines.join("\n"));
        }
        let overlay = self
            .open
            .as_deref()
            .and_then(|id| self.state.dataset()?.get(id));
        if let Some(project) = overlay {
            out.push_str("\n\n");
            out.push_str(&render::heading("Project details"));
            out.push('\n');
            let views = self.modal_views(&project.id).unwrap_or_default();
            out.push_str(&render::card(project, &self.paths, views));
        }
        out
    }
}
