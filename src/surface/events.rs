use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use crate::filter::FilterField;

/// Everything a surface reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    SearchChanged(String),
    FilterChanged(FilterField, String),
    ClearFilters,
    ShowAnother,
    OpenProject(String),
    CloseProject,
    ToggleStaffPick(String),
    SaveChanges,
    NavigateAway,
}

#[async_trait]
pub trait EventSource: Send {
    /// `None` once the source is exhausted.
    async fn next_event(&mut self) -> Option<UiEvent>;
}

/// A fixed queue of events, e.g. built from command-line flags.
#[derive(Clone, Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<UiEvent>,
}

impl ScriptedEvents {
    pub fn new<I: IntoIterator<Item = UiEvent>>(events: I) -> Self {
        Self {
            queue: events.into_iter().collect(),
        }
    }

    pub fn push(&mut self, event: UiEvent) {
        self.queue.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[async_trait]
impl EventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Option<UiEvent> {
        self.queue.pop_front()
    }
}

/// Drains `first`, then reads from `then`.
pub struct Chain<A, B> {
    first: A,
    then: B,
    first_done: bool,
}

impl<A, B> Chain<A, B> {
    pub fn new(first: A, then: B) -> Self {
        Self {
            first,
            then,
            first_done: false,
        }
    }
}

#[async_trait]
impl<A: EventSource, B: EventSource> EventSource for Chain<A, B> {
    async fn next_event(&mut self) -> Option<UiEvent> {
        if !self.first_done {
            match self.first.next_event().await {
                Some(event) => return Some(event),
                None => self.first_done = true,
            }
        }
        self.then.next_event().await
    }
}

/// Reads one command per line (`search <text>`, `open <id>`, `quit`, ...).
/// Unparseable lines are reported through `on_error` and skipped.
pub struct LineEvents<R> {
    lines: Lines<R>,
    on_error: Box<dyn FnMut(String) + Send>,
}

impl<R: AsyncBufRead + Unpin + Send> LineEvents<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            on_error: Box::new(|msg| tracing::warn!("{msg}")),
        }
    }

    pub fn on_error<F: FnMut(String) + Send + 'static>(mut self, f: F) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for LineEvents<R> {
    async fn next_event(&mut self) -> Option<UiEvent> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    (self.on_error)(format!("failed to read input: {e}"));
                    return None;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_event(&line) {
                Ok(event) => return Some(event),
                Err(e) => (self.on_error)(e),
            }
        }
    }
}

pub const COMMAND_HELP: &str = "commands: search <text> | type <value> | category <value> | year <value> | staff-pick [yes] | clear | another | open <id> | close | toggle <id> | save | quit";

pub fn parse_event(line: &str) -> Result<UiEvent, String> {
    let line = line.trim_start();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line.trim_end(), ""),
    };
    let require = |what: &str| -> Result<String, String> {
        if rest.is_empty() {
            Err(format!("'{command}' needs {what}"))
        } else {
            Ok(rest.to_string())
        }
    };
    match command.to_lowercase().as_str() {
        // search text keeps inner spacing; an empty search clears the term
        "search" | "s" => Ok(UiEvent::SearchChanged(rest.to_string())),
        "clear" => Ok(UiEvent::ClearFilters),
        "another" | "next" | "n" => Ok(UiEvent::ShowAnother),
        "open" | "o" => Ok(UiEvent::OpenProject(require("a project id")?)),
        "close" => Ok(UiEvent::CloseProject),
        "toggle" | "star" | "t" => Ok(UiEvent::ToggleStaffPick(require("a project id")?)),
        "save" => Ok(UiEvent::SaveChanges),
        "quit" | "exit" | "q" => Ok(UiEvent::NavigateAway),
        other => match FilterField::parse(other) {
            Some(field) => Ok(UiEvent::FilterChanged(field, rest.to_string())),
            None => Err(format!("unknown command '{command}'; {COMMAND_HELP}")),
        },
    }
}
