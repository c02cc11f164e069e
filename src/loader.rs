use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::materials;
use crate::record::{Material, MaterialKind, Record, TagMap};
use crate::youtube::{ensure_autoplay, extract_thumbnail, is_placeholder_poster};

/// Failure to obtain the record set. An empty list is not an error.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("request to {url} failed: {source}")]
  Http {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  #[error("{url} answered with status {status}")]
  Status { url: String, status: reqwest::StatusCode },

  #[error("malformed record list: {0}")]
  Parse(#[from] serde_json::Error),
}

/// Observable load state of a view. Exactly one holds at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
  Loading,
  Failed(String),
  Ready,
}

impl LoadPhase {
  pub fn is_loading(&self) -> bool {
    matches!(self, LoadPhase::Loading)
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      LoadPhase::Failed(msg) => Some(msg),
      _ => None,
    }
  }
}

/// Where the video list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  File(PathBuf),
  Http(String),
}

impl Source {
  pub fn parse(s: &str) -> Self {
    let s = s.trim();
    if s.starts_with("http://") || s.starts_with("https://") {
      Source::Http(s.to_string())
    } else {
      Source::File(PathBuf::from(s))
    }
  }
}

impl std::fmt::Display for Source {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Source::File(path) => write!(f, "{}", path.display()),
      Source::Http(url) => f.write_str(url),
    }
  }
}

/// A video as delivered by the source, before normalization.
#[derive(Debug, Deserialize)]
struct RawVideo {
  id: u64,
  title: Option<String>,
  titolo: Option<String>,
  #[serde(default)]
  date: String,
  url: Option<String>,
  tags: Option<BTreeMap<String, Vec<String>>>,
  /// Legacy flat tag list.
  tag: Option<Vec<String>>,
}

impl From<RawVideo> for Record {
  fn from(raw: RawVideo) -> Self {
    let title = raw.title.filter(|t| !t.is_empty()).or(raw.titolo).unwrap_or_default();
    let tags = match (raw.tags, raw.tag) {
      (Some(tags), _) => TagMap::from(tags),
      (None, Some(legacy)) => TagMap::with_group(&constants().legacy_tag_group, legacy),
      (None, None) => TagMap::new(),
    };
    // The poster is always derived from the URL; any incoming value is ignored.
    let poster = extract_thumbnail(raw.url.as_deref());
    Record { id: raw.id, title, date: raw.date, url: raw.url, tags, poster }
  }
}

/// Decode and normalize a JSON video list.
pub fn parse_videos(bytes: &[u8]) -> Result<Vec<Record>, LoadError> {
  let raw: Vec<RawVideo> = serde_json::from_slice(bytes)?;
  Ok(raw.into_iter().map(Record::from).collect())
}

async fn fetch(source: &Source) -> Result<Vec<u8>, LoadError> {
  match source {
    Source::File(path) => {
      tokio::fs::read(path).await.map_err(|source| LoadError::Io { path: path.clone(), source })
    }
    Source::Http(url) => {
      let http = |source| LoadError::Http { url: url.clone(), source };
      let response = reqwest::get(url).await.map_err(http)?;
      let status = response.status();
      if !status.is_success() {
        return Err(LoadError::Status { url: url.clone(), status });
      }
      let bytes = response.bytes().await.map_err(http)?;
      Ok(bytes.to_vec())
    }
  }
}

/// Load the whole video list. The set arrives atomically or the load fails.
pub async fn load_videos(source: &Source) -> Result<Vec<Record>, LoadError> {
  debug!(source = %source, "loader: fetching videos");
  let result = fetch(source).await.and_then(|bytes| parse_videos(&bytes));
  match &result {
    Ok(records) => info!(source = %source, count = records.len(), "loader: videos loaded"),
    Err(e) => warn!(source = %source, err = %e, "loader: videos failed to load"),
  }
  result
}

/// Backfill video posters and make embeds autoplay.
pub fn normalize_material(mut m: Material) -> Material {
  if m.kind == MaterialKind::Video && m.record.url.is_some() {
    if let Some(thumbnail) = extract_thumbnail(m.record.url.as_deref())
      && m.record.poster.as_deref().is_none_or(is_placeholder_poster)
    {
      m.record.poster = Some(thumbnail);
    }
    if let Some(embed) = m.embed.as_deref() {
      m.embed = Some(ensure_autoplay(embed));
    }
  }
  m
}

/// The built-in materials, normalized.
pub fn load_materials() -> Result<Vec<Material>, LoadError> {
  let list: Vec<Material> = materials::builtin().into_iter().map(normalize_material).collect();
  info!(count = list.len(), "loader: materials loaded");
  Ok(list)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn source_parse_picks_transport() {
    assert_eq!(Source::parse("https://example.org/v.json"), Source::Http("https://example.org/v.json".to_string()));
    assert_eq!(Source::parse("assets/videos.json"), Source::File(PathBuf::from("assets/videos.json")));
  }

  #[test]
  fn parse_full_record() {
    let json = br#"[{"id": 7, "title": "Il mondo", "date": "2024-5-1",
      "url": "https://youtu.be/abc", "poster": "ignored.png",
      "tags": {"argomento": ["Russia"], "format": ["video"]}}]"#;
    let records = parse_videos(json).unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.id, 7);
    assert_eq!(r.title, "Il mondo");
    assert_eq!(r.tags.values("argomento"), ["Russia"]);
    assert_eq!(r.poster.as_deref(), Some("https://img.youtube.com/vi/abc/hqdefault.jpg"));
  }

  #[test]
  fn title_falls_back_to_titolo_then_empty() {
    let json = br#"[{"id": 1, "titolo": "Titolo", "date": "2024-01-01"}, {"id": 2, "date": "2024-01-01"}]"#;
    let records = parse_videos(json).unwrap();
    assert_eq!(records[0].title, "Titolo");
    assert_eq!(records[1].title, "");
    assert_eq!(records[1].poster, None);
    assert!(records[1].tags.is_empty());
  }

  #[test]
  fn legacy_tag_list_becomes_argomento_group() {
    let json = br#"[{"id": 1, "date": "2024-01-01", "tag": ["Cina", "USA"]}]"#;
    let records = parse_videos(json).unwrap();
    assert_eq!(records[0].tags.values("argomento"), ["Cina", "USA"]);
  }

  #[test]
  fn tags_take_precedence_over_legacy_tag() {
    let json = br#"[{"id": 1, "date": "2024-01-01", "tags": {"format": ["pdf"]}, "tag": ["Cina"]}]"#;
    let records = parse_videos(json).unwrap();
    assert!(records[0].tags.values("argomento").is_empty());
    assert_eq!(records[0].tags.values("format"), ["pdf"]);
  }

  #[test]
  fn empty_list_is_success() {
    assert!(parse_videos(b"[]").unwrap().is_empty());
  }

  #[test]
  fn malformed_payload_is_parse_error() {
    assert!(matches!(parse_videos(b"{\"not\": \"a list\"}"), Err(LoadError::Parse(_))));
    assert!(matches!(parse_videos(b"[{\"title\": \"no id\"}]"), Err(LoadError::Parse(_))));
  }

  #[tokio::test]
  async fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"[{{"id": 1, "title": "a", "date": "2024-01-01"}}]"#).unwrap();
    let records = load_videos(&Source::File(file.path().to_path_buf())).await.unwrap();
    assert_eq!(records.len(), 1);
  }

  #[tokio::test]
  async fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_videos(&Source::File(dir.path().join("missing.json"))).await.unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
  }

  #[test]
  fn material_placeholder_poster_is_backfilled() {
    let mut m = materials::video(5, "t", "https://www.youtube.com/embed/XYZ?rel=0", "a", "2024-01-01");
    m.record.poster = Some("assets/video-placeholder.svg".to_string());
    m.embed = Some("https://www.youtube.com/embed/XYZ?rel=0".to_string());
    let m = normalize_material(m);
    assert_eq!(m.record.poster.as_deref(), Some("https://img.youtube.com/vi/XYZ/hqdefault.jpg"));
    assert_eq!(m.embed.as_deref(), Some("https://www.youtube.com/embed/XYZ?rel=0&autoplay=1"));
  }

  #[test]
  fn material_real_poster_is_kept() {
    let mut m = materials::video(5, "t", "https://www.youtube.com/embed/XYZ", "a", "2024-01-01");
    m.record.poster = Some("https://cdn.example.org/custom.jpg".to_string());
    let m = normalize_material(m);
    assert_eq!(m.record.poster.as_deref(), Some("https://cdn.example.org/custom.jpg"));
  }

  #[test]
  fn builtin_materials_load() {
    let list = load_materials().unwrap();
    assert!(!list.is_empty());
    assert!(list.iter().filter(|m| m.kind == MaterialKind::Pdf).all(|m| m.playback_url().is_none()));
  }
}
