use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::constants::constants;

/// Static description of the archive shown in the header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SiteInfo {
  pub title: String,
  pub description: String,
  pub author: String,
}

impl Default for SiteInfo {
  fn default() -> Self {
    let c = constants();
    Self { title: c.site_title.clone(), description: c.site_description.clone(), author: c.site_author.clone() }
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
  pub theme_name: Option<String>,
  /// Video list location: a local path or an `http(s)://` URL.
  pub source: Option<String>,
  /// Locale used to render month names for the month filter (e.g. `it`, `en`).
  pub month_locale: Option<String>,
  pub site: SiteInfo,
}

impl Config {
  fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "archivio")
  }

  /// Default location of `prefs.toml`, if the platform has a config dir.
  pub fn default_path() -> Option<PathBuf> {
    Self::project_dirs().map(|d| d.config_dir().join("prefs.toml"))
  }

  /// Directory for the rolling log files.
  pub fn log_dir() -> PathBuf {
    Self::project_dirs().map(|d| d.data_local_dir().join("logs")).unwrap_or_else(|| PathBuf::from("logs"))
  }

  /// Load from `path` (or the default location). Missing or invalid files fall back to defaults.
  pub fn load(path: Option<&Path>) -> Self {
    let path = match path {
      Some(p) => Some(p.to_path_buf()),
      None => Self::default_path(),
    };
    let Some(path) = path else { return Self::default() };
    match std::fs::read_to_string(&path) {
      Ok(content) => match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
          warn!(path = %path.display(), err = %e, "config: invalid prefs file, using defaults");
          Self::default()
        }
      },
      Err(e) => {
        debug!(path = %path.display(), err = %e, "config: no prefs file, using defaults");
        Self::default()
      }
    }
  }

  pub fn save(&self) {
    let Some(path) = Self::default_path() else { return };
    if let Some(dir) = path.parent()
      && std::fs::create_dir_all(dir).is_ok()
      && let Ok(content) = toml::to_string(self)
      && let Err(e) = std::fs::write(&path, content)
    {
      warn!(path = %path.display(), err = %e, "config: failed to save prefs");
    }
  }

  pub fn source(&self) -> &str {
    self.source.as_deref().unwrap_or(&constants().default_source)
  }

  pub fn month_locale(&self) -> &str {
    self.month_locale.as_deref().unwrap_or(&constants().default_month_locale)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(Some(&dir.path().join("nope.toml")));
    assert!(config.theme_name.is_none());
    assert_eq!(config.source(), constants().default_source);
    assert_eq!(config.site, SiteInfo::default());
  }

  #[test]
  fn partial_file_keeps_defaults_for_the_rest() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "source = \"https://example.org/videos.json\"\nmonth_locale = \"en\"").unwrap();
    let config = Config::load(Some(file.path()));
    assert_eq!(config.source(), "https://example.org/videos.json");
    assert_eq!(config.month_locale(), "en");
    assert_eq!(config.site.title, constants().site_title);
  }

  #[test]
  fn invalid_file_yields_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is = = not toml").unwrap();
    let config = Config::load(Some(file.path()));
    assert!(config.source.is_none());
  }

  #[test]
  fn site_section_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[site]\ntitle = \"Mio archivio\"\ndescription = \"d\"\nauthor = \"a\"").unwrap();
    let config = Config::load(Some(file.path()));
    assert_eq!(config.site.title, "Mio archivio");
    assert_eq!(config.site.author, "a");
  }
}
