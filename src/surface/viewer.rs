use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::{views_text, Flow, Fragments, Surface, UiEvent, LOADING_VIEWS, LOAD_ERROR_MESSAGE};
use crate::counter::{CounterReading, ViewCounter};
use crate::dataset::{DatasetState, MediaPaths, Project};
use crate::output::render;
use crate::picker::FeaturedPicker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SiteStats {
    pub total_projects: usize,
    pub staff_picks: usize,
    pub total_views: CounterReading,
}

/// Homepage spotlight: site stats plus one random project at a time.
pub struct ViewerSurface {
    state: DatasetState,
    counter: ViewCounter,
    paths: MediaPaths,
    picker: FeaturedPicker,
    rng: Box<dyn RngCore + Send>,
    featured: Option<usize>,
    stats: Option<SiteStats>,
    fragments: Fragments,
}

impl ViewerSurface {
    pub fn new(state: DatasetState, counter: ViewCounter, paths: MediaPaths) -> Self {
        Self {
            state,
            counter,
            paths,
            picker: FeaturedPicker::new(),
            rng: Box::new(StdRng::from_entropy()),
            featured: None,
            stats: None,
            fragments: Fragments::default(),
        }
    }

    pub fn with_rng<R: RngCore + Send + 'static>(mut self, rng: R) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn featured(&self) -> Option<&Project> {
        let idx = self.featured?;
        self.state.dataset()?.projects.get(idx)
    }

    pub fn featured_index(&self) -> Option<usize> {
        self.featured
    }

    pub fn stats(&self) -> Option<SiteStats> {
        self.stats
    }

    pub fn featured_views(&self) -> Option<&str> {
        let project = self.featured()?;
        self.fragments.get(&format!("view-count-{}", project.id))
    }

    pub async fn update_stats(&mut self) -> Option<SiteStats> {
        let dataset = self.state.dataset()?;
        let total_projects = dataset.len();
        let staff_picks = dataset.staff_pick_count();
        let total_views = self.counter.aggregate_all_counters().await;
        let stats = SiteStats {
            total_projects,
            staff_picks,
            total_views,
        };
        self.stats = Some(stats);
        Some(stats)
    }

    /// Picks a new spotlight project and counts the view.
    pub async fn show_random_project(&mut self) -> Option<CounterReading> {
        let len = self.state.dataset()?.len();
        let idx = self.picker.pick(len, &mut *self.rng)?;
        let id = self.state.dataset()?.projects.get(idx)?.id.clone();

        if let Some(prev) = self.featured.take() {
            let prev_id = self
                .state
                .dataset()
                .and_then(|d| d.projects.get(prev))
                .map(|p| p.id.clone());
            if let Some(prev_id) = prev_id {
                self.fragments.remove(&format!("view-count-{prev_id}"));
            }
        }
        self.featured = Some(idx);
        let element = format!("view-count-{id}");
        self.fragments.insert(element.clone(), LOADING_VIEWS);

        let reading = self.counter.increment_counter(&id).await;
        self.fragments.update_if_present(&element, views_text(reading));
        Some(reading)
    }
}

#[async_trait]
impl Surface for ViewerSurface {
    fn name(&self) -> &'static str {
        "feature"
    }

    async fn start(&mut self) -> Vec<String> {
        self.update_stats().await;
        self.show_random_project().await;
        Vec::new()
    }

    async fn handle(&mut self, event: UiEvent) -> (Flow, Vec<String>) {
        match event {
            UiEvent::ShowAnother => {
                self.show_random_project().await;
                (Flow::Continue, Vec::new())
            }
            UiEvent::NavigateAway => (Flow::Leave, Vec::new()),
            other => (
                Flow::Continue,
                vec![render::warning(&format!("not available on this page: {other:?}"))],
            ),
        }
    }

    fn render(&self) -> String {
        if let DatasetState::Failed(_) = self.state {
            return LOAD_ERROR_MESSAGE.to_string();
        }
        let mut out = String::new();
        if let Some(stats) = self.stats {
            out.push_str(&render::stats_block(
                stats.total_projects,
                stats.staff_picks,
                stats.total_views,
            ));
            out.push_str("\n\n");
        }
        out.push_str(&render::heading("Featured project"));
        out.push('\n');
        match self.featured() {
            Some(project) => {
                let views = self.featured_views().unwrap_or_default();
                out.push_str(&render::card(project, &self.paths, views));
            }
            None => out.push_str("No projects to show."),
        }
        out
    }
}
