use std::collections::BTreeSet;

use crate::dataset::Project;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StaffPickGate {
    #[default]
    Any,
    Yes,
}

impl StaffPickGate {
    /// Only the empty value and `yes` are defined.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "any" => Some(Self::Any),
            "yes" => Some(Self::Yes),
            _ => None,
        }
    }

    pub fn admits(self, project: &Project) -> bool {
        match self {
            Self::Any => true,
            Self::Yes => project.staff_pick,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterField {
    ProjectType,
    Category,
    Year,
    StaffPick,
}

impl FilterField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "type" | "project-type" | "project_type" => Some(Self::ProjectType),
            "category" => Some(Self::Category),
            "year" => Some(Self::Year),
            "staff-pick" | "staff_pick" | "staffpick" => Some(Self::StaffPick),
            _ => None,
        }
    }
}

/// Gallery filter state. Empty strings mean "no constraint".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub project_type: String,
    pub category: String,
    pub year: String,
    pub staff_pick: StaffPickGate,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sets one categorical criterion. Fails only for an undefined
    /// staff-pick value.
    pub fn set(&mut self, field: FilterField, value: &str) -> Result<(), String> {
        match field {
            FilterField::ProjectType => self.project_type = value.to_string(),
            FilterField::Category => self.category = value.to_string(),
            FilterField::Year => self.year = value.to_string(),
            FilterField::StaffPick => {
                self.staff_pick = StaffPickGate::parse(value)
                    .ok_or_else(|| format!("invalid staff-pick filter '{value}', expected 'yes'"))?;
            }
        }
        Ok(())
    }

    pub fn matches(&self, project: &Project) -> bool {
        let term = self.search.to_lowercase();
        let matches_search = term.is_empty()
            || project.first_name.to_lowercase().contains(&term)
            || project.last_name.to_lowercase().contains(&term)
            || project.project_title.to_lowercase().contains(&term);
        let matches_type = self.project_type.is_empty() || project.project_type == self.project_type;
        let matches_category = self.category.is_empty() || project.category == self.category;
        let matches_year = self.year.is_empty() || project.year == self.year;

        matches_search
            && matches_type
            && matches_category
            && matches_year
            && self.staff_pick.admits(project)
    }
}

/// Ordered subsequence of `projects` admitted by `criteria`.
pub fn apply_filters<'a>(projects: &'a [Project], criteria: &FilterCriteria) -> Vec<&'a Project> {
    projects.iter().filter(|p| criteria.matches(p)).collect()
}

/// Like [`apply_filters`] but yields positions into `projects`.
pub fn matching_indices(projects: &[Project], criteria: &FilterCriteria) -> Vec<usize> {
    projects
        .iter()
        .enumerate()
        .filter(|(_, p)| criteria.matches(p))
        .map(|(i, _)| i)
        .collect()
}

pub fn results_summary(shown: usize, total: usize) -> String {
    format!("Showing {shown} of {total} projects")
}

/// Distinct values present in the dataset, for filter choices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Facets {
    pub project_types: Vec<String>,
    pub categories: Vec<String>,
    pub years: Vec<String>,
}

impl Facets {
    pub fn collect(projects: &[Project]) -> Self {
        let mut types = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut years = BTreeSet::new();
        for p in projects {
            if !p.project_type.is_empty() {
                types.insert(p.project_type.clone());
            }
            if !p.category.is_empty() {
                categories.insert(p.category.clone());
            }
            if !p.year.is_empty() {
                years.insert(p.year.clone());
            }
        }
        Self {
            project_types: types.into_iter().collect(),
            categories: categories.into_iter().collect(),
            years: years.into_iter().collect(),
        }
    }
}
