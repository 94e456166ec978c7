use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

/// `~/.showcase/config.yml`. Every key is optional; command-line flags win.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub dataset: Option<String>,
    pub store: Option<String>,
    pub database_url: Option<String>,
    pub auth: Option<String>,
    pub namespace: Option<String>,
    #[serde(alias = "file_store")]
    pub file_store_path: Option<String>,
    pub timeout: Option<u64>,
    pub rate: Option<u32>,
    pub proxy: Option<String>,
    pub atomic: Option<bool>,
    pub media_root: Option<String>,
    pub pdf_placeholder: Option<String>,
    pub fallback_placeholder: Option<String>,
    pub export_dir: Option<String>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".showcase").join("config.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn parse_config(contents: &str, origin: &Path) -> Result<ConfigFile, String> {
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str::<ConfigFile>(contents)
        .map_err(|e| format!("failed to parse config '{}': {e}", origin.display()))
}

pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_config(&contents, path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> &'static str {
    r#"# Showcase config
#
# Location (default):
#   ~/.showcase/config.yml

# Dataset: a path or an http(s) URL serving { "projects": [...] }
dataset: ./projects.json

# Counter store: memory | file | firebase
store: file
file_store_path: ./views.json
# database_url: https://example-default-rtdb.firebaseio.com
# auth: <database secret or id token>
namespace: views

# HTTP
timeout: 10
# Requests per second against the database, 0 = unlimited
rate: 0
# proxy: http://127.0.0.1:8080

# Use the store's server-side increment when it has one
atomic: false

# Media
media_root: ./projects
pdf_placeholder: ./assets/pdf-placeholder.png
fallback_placeholder: ./assets/placeholder.png

# Curation exports land here; publishing is a manual copy
export_dir: ./exports

# Gallery listing: text | json
output_format: text

no_color: false
"#
}

pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_yaml_parses() {
        let cfg = parse_config(default_config_yaml(), Path::new("default")).unwrap();
        assert_eq!(cfg.store.as_deref(), Some("file"));
        assert_eq!(cfg.namespace.as_deref(), Some("views"));
        assert_eq!(cfg.rate, Some(0));
        assert_eq!(cfg.atomic, Some(false));
        assert!(cfg.database_url.is_none());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(
            parse_config("  \n", Path::new("x")).unwrap(),
            ConfigFile::default()
        );
    }

    #[test]
    fn invalid_value_reports_origin() {
        let err = parse_config("timeout: soon", Path::new("cfg.yml")).unwrap_err();
        assert!(err.contains("cfg.yml"));
    }

    #[test]
    fn missing_file_depends_on_allow_missing() {
        let path = env::temp_dir().join(format!("showcase-missing-{}.yml", std::process::id()));
        assert!(load_config(&path, true).is_ok());
        assert!(load_config(&path, false).is_err());
    }

    #[test]
    fn ensure_writes_once() {
        let dir = env::temp_dir().join(format!("showcase-cfg-{}", std::process::id()));
        let path = dir.join("config.yml");
        let _ = std::fs::remove_dir_all(&dir);
        assert_eq!(ensure_default_config_file(&path), Ok(true));
        assert_eq!(ensure_default_config_file(&path), Ok(false));
        assert!(load_config(&path, false).is_ok());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn tilde_expands_to_home() {
        if let Some(home) = home_dir() {
            assert_eq!(expand_tilde("~/x.json"), home.join("x.json"));
        }
        assert_eq!(expand_tilde("./x.json"), PathBuf::from("./x.json"));
    }
}
