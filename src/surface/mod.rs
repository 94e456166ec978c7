//! The three front-end surfaces (spotlight, gallery, curation).
//!
//! Each surface owns its dataset copy and reacts to [`UiEvent`]s; rendering
//! is a pure function of its state. [`drive`] wires a surface to any
//! [`EventSource`].

pub mod curation;
pub mod events;
pub mod gallery;
pub mod viewer;

use std::collections::BTreeMap;

use async_trait::async_trait;

pub use curation::CurationSurface;
pub use events::{Chain, EventSource, LineEvents, ScriptedEvents, UiEvent};
pub use gallery::GallerySurface;
pub use viewer::ViewerSurface;

use crate::counter::CounterReading;

pub const LOAD_ERROR_MESSAGE: &str = "Error loading projects. Please refresh the page.";
pub const LOADING_VIEWS: &str = "Loading views...";
/// Placeholder for a grid cell whose count is still being read.
pub const LOADING_GRID: &str = "Loading...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Leave,
}

#[async_trait]
pub trait Surface: Send {
    fn name(&self) -> &'static str;

    /// Runs once after construction, before any event.
    async fn start(&mut self) -> Vec<String> {
        Vec::new()
    }

    /// Applies one event. Returned lines are notices for the user
    /// (warnings, confirmations), separate from the rendered view.
    async fn handle(&mut self, event: UiEvent) -> (Flow, Vec<String>);

    /// Runs when the event source ends before the surface left on its own.
    async fn input_closed(&mut self) -> Vec<String> {
        Vec::new()
    }

    fn render(&self) -> String;
}

/// Runs `surface` until the source is exhausted or the surface leaves.
/// `emit` receives notices and each re-rendered view.
pub async fn drive<S, E, F>(surface: &mut S, events: &mut E, mut emit: F)
where
    S: Surface + ?Sized,
    E: EventSource + ?Sized,
    F: FnMut(String) + Send,
{
    tracing::info!(surface = surface.name(), "surface started");
    for notice in surface.start().await {
        emit(notice);
    }
    emit(surface.render());
    loop {
        let Some(event) = events.next_event().await else {
            for notice in surface.input_closed().await {
                emit(notice);
            }
            break;
        };
        tracing::debug!(surface = surface.name(), ?event, "event");
        let (flow, notices) = surface.handle(event).await;
        for notice in notices {
            emit(notice);
        }
        if flow == Flow::Leave {
            break;
        }
        emit(surface.render());
    }
    tracing::info!(surface = surface.name(), "surface closed");
}

/// Rendered text fragments keyed by element id, e.g. `gallery-view-p1`.
///
/// Counter completions that arrive after their element was torn down (the
/// grid was re-filtered, the overlay closed) are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fragments {
    slots: BTreeMap<String, String>,
}

impl Fragments {
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        self.slots.insert(id.into(), text.into());
    }

    pub fn remove(&mut self, id: &str) {
        self.slots.remove(id);
    }

    pub fn remove_prefixed(&mut self, prefix: &str) {
        self.slots.retain(|k, _| !k.starts_with(prefix));
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.slots.get(id).map(|s| s.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Returns whether the element still existed.
    pub fn update_if_present(&mut self, id: &str, text: impl Into<String>) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) => {
                *slot = text.into();
                true
            }
            None => {
                tracing::debug!(element = id, "display element gone, dropping update");
                false
            }
        }
    }
}

/// Per-project view text. A failed read renders empty.
pub fn views_text(reading: CounterReading) -> String {
    match reading {
        CounterReading::Count(n) => format!("\u{1f441} {n} views"),
        CounterReading::Unavailable => String::new(),
    }
}
