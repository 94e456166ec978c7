/// How a project's asset is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Embedded document viewer; lists show the placeholder thumbnail.
    Document,
    Image,
}

impl MediaKind {
    pub fn from_file_name(file_name: &str) -> Self {
        // no dot: the whole name is taken as the extension
        let ext = file_name.rsplit('.').next().unwrap_or_default();
        if ext.eq_ignore_ascii_case("pdf") {
            Self::Document
        } else {
            Self::Image
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "pdf",
            Self::Image => "image",
        }
    }
}

/// Asset locations used when rendering a project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaPaths {
    pub media_root: String,
    pub pdf_placeholder: String,
    pub fallback_placeholder: String,
}

impl Default for MediaPaths {
    fn default() -> Self {
        Self {
            media_root: "./projects".to_string(),
            pdf_placeholder: "./assets/pdf-placeholder.png".to_string(),
            fallback_placeholder: "./assets/placeholder.png".to_string(),
        }
    }
}

impl MediaPaths {
    pub fn media(&self, file_name: &str) -> String {
        format!("{}/{}", self.media_root.trim_end_matches('/'), file_name)
    }

    pub fn thumbnail(&self, file_name: &str) -> String {
        match MediaKind::from_file_name(file_name) {
            MediaKind::Document => self.pdf_placeholder.clone(),
            MediaKind::Image if file_name.trim().is_empty() => self.fallback_placeholder.clone(),
            MediaKind::Image => self.media(file_name),
        }
    }
}
