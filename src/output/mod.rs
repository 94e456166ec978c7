pub mod render;

use serde::Serialize;

use crate::counter::CounterReading;
use crate::dataset::{MediaPaths, Project};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// One gallery entry as written by `--format json` / `--output`.
#[derive(Clone, Debug, Serialize)]
pub struct OutputRecord {
    pub id: String,
    pub title: String,
    pub author: String,
    pub project_type: String,
    pub category: String,
    pub year: String,
    pub staff_pick: bool,
    pub media_kind: &'static str,
    pub media: String,
    pub thumbnail: String,
    /// `None` when the counter was never read or the read failed.
    pub views: Option<u64>,
}

pub fn build_records<'a, I>(projects: I, paths: &MediaPaths) -> Vec<OutputRecord>
where
    I: IntoIterator<Item = (&'a Project, Option<CounterReading>)>,
{
    projects
        .into_iter()
        .map(|(p, views)| OutputRecord {
            id: p.id.clone(),
            title: p.project_title.clone(),
            author: p.author(),
            project_type: p.project_type.clone(),
            category: p.category.clone(),
            year: p.year.clone(),
            staff_pick: p.staff_pick,
            media_kind: p.media_kind().label(),
            media: paths.media(&p.file_name),
            thumbnail: paths.thumbnail(&p.file_name),
            views: views.and_then(CounterReading::count),
        })
        .collect()
}

pub fn render_text(records: &[OutputRecord]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&r.id);
        out.push('\t');
        out.push_str(&r.title);
        out.push('\t');
        out.push_str(&r.author);
        out.push('\t');
        match r.views {
            Some(n) => out.push_str(&n.to_string()),
            None => out.push('-'),
        }
        out.push('\n');
    }
    out.into_bytes()
}

pub fn render_json(records: &[OutputRecord]) -> Vec<u8> {
    serde_json::to_vec_pretty(records).unwrap_or_else(|_| b"[]\n".to_vec())
}

pub fn render(format: OutputFormat, records: &[OutputRecord]) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(records),
        OutputFormat::Json => render_json(records),
    }
}
