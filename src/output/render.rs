use colored::Colorize;

use crate::counter::CounterReading;
use crate::dataset::{MediaKind, MediaPaths, Project};
use crate::filter::Facets;

pub const STAR: &str = "\u{2b50}";

pub fn badges(project: &Project) -> String {
    let mut parts = vec![
        format!("[{}]", project.project_type).cyan().to_string(),
        format!("[{}]", project.category).magenta().to_string(),
        format!("[{}]", project.year).blue().to_string(),
    ];
    if project.staff_pick {
        parts.push("[Staff Pick]".bold().yellow().to_string());
    }
    parts.join(" ")
}

pub fn media_line(project: &Project, paths: &MediaPaths) -> String {
    match project.media_kind() {
        MediaKind::Document => format!("{} {}", "document:".bold().white(), paths.media(&project.file_name)),
        MediaKind::Image => format!("{} {}", "image:".bold().white(), paths.media(&project.file_name)),
    }
}

/// Full presentation used by the spotlight and the detail overlay.
pub fn card(project: &Project, paths: &MediaPaths, views_line: &str) -> String {
    let mut out = String::new();
    out.push_str(&media_line(project, paths));
    out.push('\n');
    out.push_str(&project.project_title.bold().green().to_string());
    out.push('\n');
    out.push_str(&format!("{} {}", "By:".bold().white(), project.author()));
    out.push('\n');
    out.push_str(&badges(project));
    out.push('\n');
    out.push_str(views_line);
    out
}

/// One line of the gallery grid.
pub fn grid_entry(project: &Project, paths: &MediaPaths, views_line: &str) -> String {
    format!(
        "{} {} :: {} {} :: {} :: {}",
        format!("[{}]", project.id).bold().white(),
        project.project_title.bold().green(),
        project.author(),
        badges(project),
        paths.thumbnail(&project.file_name),
        views_line
    )
}

pub fn stats_block(total_projects: usize, staff_picks: usize, total_views: CounterReading) -> String {
    format!(
        ":: {:<12}: {}\n:: {:<12}: {}\n:: {:<12}: {}",
        "Projects",
        total_projects,
        "Staff picks",
        staff_picks,
        "Total views",
        total_views
    )
}

/// Filter choices available in the loaded dataset.
pub fn facets(facets: &Facets) -> String {
    let list = |values: &[String]| {
        if values.is_empty() {
            "-".to_string()
        } else {
            values.join(", ")
        }
    };
    format!(
        ":: {:<12}: {}\n:: {:<12}: {}\n:: {:<12}: {}",
        "Types",
        list(&facets.project_types),
        "Categories",
        list(&facets.categories),
        "Years",
        list(&facets.years)
    )
}

pub struct TableRow<'a> {
    pub project: &'a Project,
    pub views: u64,
}

/// Curation table: one row per project, star marks staff picks.
pub fn table(rows: &[TableRow<'_>], paths: &MediaPaths) -> String {
    let mut out = String::new();
    out.push_str(
        &format!(
            "{:<10} {:<24} {:<28} {:<12} {:<14} {:<6} {:>7} {}",
            "ID", "NAME", "TITLE", "TYPE", "CATEGORY", "YEAR", "VIEWS", "PICK"
        )
        .bold()
        .white()
        .to_string(),
    );
    for row in rows {
        let p = row.project;
        let star = if p.staff_pick {
            STAR.to_string()
        } else {
            "\u{00b7}".dimmed().to_string()
        };
        out.push('\n');
        out.push_str(&format!(
            "{:<10} {:<24} {:<28} {:<12} {:<14} {:<6} {:>7} {}  {}",
            p.id,
            p.author(),
            p.project_title,
            p.project_type,
            p.category,
            p.year,
            format!("\u{1f441} {}", row.views),
            star,
            paths.thumbnail(&p.file_name).dimmed()
        ));
    }
    out
}

pub fn heading(text: &str) -> String {
    format!("{}", text.bold().white())
}

pub fn warning(text: &str) -> String {
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        "WRN".bold().yellow(),
        "]".bold().white(),
        text.bold().white()
    )
}

pub fn notice(text: &str) -> String {
    format!(
        "{}{}{} {}",
        "[".bold().white(),
        "OK".bold().green(),
        "]".bold().white(),
        text.bold().white()
    )
}
