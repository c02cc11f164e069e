use chrono::{DateTime, Locale, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::youtube::build_playback_url;

// --- Tags ---

/// Tag groups of a record: group name -> values, in first-seen order, without duplicates.
///
/// Storage is case-significant; the `*_ci` helpers compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagMap(BTreeMap<String, Vec<String>>);

impl TagMap {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, group: impl Into<String>, value: impl Into<String>) {
    let value = value.into();
    let values = self.0.entry(group.into()).or_default();
    if !values.contains(&value) {
      values.push(value);
    }
  }

  pub fn with_group<I, S>(group: &str, values: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    let mut map = Self::new();
    for v in values {
      map.insert(group, v);
    }
    map
  }

  /// Values of a group; empty when the group is absent.
  pub fn values(&self, group: &str) -> &[String] {
    self.0.get(group).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn contains_ci(&self, group: &str, value: &str) -> bool {
    let value = value.to_lowercase();
    self.values(group).iter().any(|v| v.to_lowercase() == value)
  }

  /// Every value of every group, groups in key order.
  pub fn all_values(&self) -> impl Iterator<Item = &str> {
    self.0.values().flatten().map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.values().all(Vec::is_empty)
  }
}

impl From<BTreeMap<String, Vec<String>>> for TagMap {
  fn from(raw: BTreeMap<String, Vec<String>>) -> Self {
    let mut map = Self::new();
    for (group, values) in raw {
      // Keep declared-but-empty groups visible.
      map.0.entry(group.clone()).or_default();
      for v in values {
        map.insert(group.as_str(), v);
      }
    }
    map
  }
}

// --- Dates ---

/// Parse a `year-month-day` date, month and day optionally zero-padded.
/// RFC 3339 timestamps are accepted too (date part only).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
  let s = s.trim();
  let mut parts = s.splitn(3, '-');
  let parsed = (|| {
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let day = parts.next()?.parse::<u32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
  })();
  parsed.or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Map a short locale tag (`it`, `en-GB`, `fr_FR`, …) to a chrono locale. Unknown tags use `en_US`.
pub fn month_locale(tag: &str) -> Locale {
  match tag.trim().to_lowercase().replace('-', "_").as_str() {
    "it" | "it_it" => Locale::it_IT,
    "en_gb" => Locale::en_GB,
    "fr" | "fr_fr" => Locale::fr_FR,
    "de" | "de_de" => Locale::de_DE,
    "es" | "es_es" => Locale::es_ES,
    "pt" | "pt_pt" => Locale::pt_PT,
    _ => Locale::en_US,
  }
}

/// Full month name of `date` in `locale` (e.g. `ottobre` for `it_IT`).
pub fn month_name(date: NaiveDate, locale: Locale) -> String {
  date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().format_localized("%B", locale).to_string()).unwrap_or_default()
}

// --- Records ---

/// A catalog video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
  pub id: u64,
  pub title: String,
  /// Textual `year-month-day` date, kept as delivered by the source.
  pub date: String,
  pub url: Option<String>,
  #[serde(skip_serializing_if = "TagMap::is_empty")]
  pub tags: TagMap,
  pub poster: Option<String>,
}

impl Record {
  pub fn parsed_date(&self) -> Option<NaiveDate> {
    parse_date(&self.date)
  }

  pub fn playback_url(&self, autoplay: bool) -> String {
    build_playback_url(self.url.as_deref(), autoplay)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
  Pdf,
  Video,
  Link,
  Document,
}

impl MaterialKind {
  pub fn label(self) -> &'static str {
    match self {
      MaterialKind::Pdf => "pdf",
      MaterialKind::Video => "video",
      MaterialKind::Link => "link",
      MaterialKind::Document => "document",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Analisi,
  Teoria,
  Storico,
  #[serde(rename = "attualità")]
  Attualita,
  Ricerca,
}

impl Category {
  pub const ALL: [Category; 5] =
    [Category::Analisi, Category::Teoria, Category::Storico, Category::Attualita, Category::Ricerca];

  pub fn label(self) -> &'static str {
    match self {
      Category::Analisi => "analisi",
      Category::Teoria => "teoria",
      Category::Storico => "storico",
      Category::Attualita => "attualità",
      Category::Ricerca => "ricerca",
    }
  }

  /// Parse a category label; the unaccented `attualita` is accepted as well.
  pub fn from_label(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "attualita" => Some(Category::Attualita),
      other => Self::ALL.into_iter().find(|c| c.label() == other),
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// A curated material: a document, a link, or a video with its own embed URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Material {
  #[serde(flatten)]
  pub record: Record,
  #[serde(rename = "type")]
  pub kind: MaterialKind,
  pub category: Option<Category>,
  pub author: Option<String>,
  pub description: Option<String>,
  pub embed: Option<String>,
  pub featured: bool,
}

impl Material {
  /// Inline playback URL, present only for videos with a non-empty embed.
  pub fn playback_url(&self) -> Option<&str> {
    if self.kind != MaterialKind::Video {
      return None;
    }
    self.embed.as_deref().filter(|e| !e.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_map_dedups_and_keeps_order() {
    let mut tags = TagMap::new();
    tags.insert("argomento", "Russia");
    tags.insert("argomento", "Cina");
    tags.insert("argomento", "Russia");
    assert_eq!(tags.values("argomento"), ["Russia", "Cina"]);
    assert!(tags.values("format").is_empty());
  }

  #[test]
  fn tag_map_contains_ci() {
    let tags = TagMap::with_group("format", ["Video"]);
    assert!(tags.contains_ci("format", "video"));
    assert!(tags.contains_ci("format", "VIDEO"));
    assert!(!tags.contains_ci("Format", "video"));
  }

  #[test]
  fn tag_map_from_raw_keeps_empty_groups() {
    let raw = BTreeMap::from([("a".to_string(), vec![]), ("b".to_string(), vec!["x".to_string(), "x".to_string()])]);
    let tags = TagMap::from(raw);
    assert!(tags.values("a").is_empty());
    assert_eq!(tags.values("b"), ["x"]);
    assert!(!tags.is_empty());
    assert!(TagMap::from(BTreeMap::from([("a".to_string(), vec![])])).is_empty());
  }

  #[test]
  fn parse_padded_and_unpadded_dates() {
    assert_eq!(parse_date("2025-10-22"), NaiveDate::from_ymd_opt(2025, 10, 22));
    assert_eq!(parse_date("2025-1-30"), NaiveDate::from_ymd_opt(2025, 1, 30));
    assert_eq!(parse_date(" 2025-9-3 "), NaiveDate::from_ymd_opt(2025, 9, 3));
  }

  #[test]
  fn parse_rfc3339_timestamp() {
    assert_eq!(parse_date("2024-03-05T10:00:00Z"), NaiveDate::from_ymd_opt(2024, 3, 5));
  }

  #[test]
  fn invalid_dates_are_none() {
    assert_eq!(parse_date(""), None);
    assert_eq!(parse_date("2025-13-01"), None);
    assert_eq!(parse_date("2025-02-30"), None);
    assert_eq!(parse_date("ieri"), None);
    assert_eq!(parse_date("2025-10"), None);
  }

  #[test]
  fn month_names_follow_locale() {
    let date = NaiveDate::from_ymd_opt(2025, 10, 22).unwrap();
    assert_eq!(month_name(date, Locale::en_US), "October");
    assert_eq!(month_name(date, month_locale("it")).to_lowercase(), "ottobre");
  }

  #[test]
  fn unknown_locale_falls_back_to_english() {
    assert_eq!(month_locale("xx"), Locale::en_US);
    assert_eq!(month_locale("IT-it"), Locale::it_IT);
  }

  #[test]
  fn category_labels_round_trip() {
    for c in Category::ALL {
      assert_eq!(Category::from_label(c.label()), Some(c));
    }
    assert_eq!(Category::from_label("Attualita"), Some(Category::Attualita));
    assert_eq!(Category::from_label("sport"), None);
  }

  #[test]
  fn material_playback_requires_video_embed() {
    let record = Record { id: 1, title: String::new(), date: String::new(), url: None, tags: TagMap::new(), poster: None };
    let mut m = Material {
      record,
      kind: MaterialKind::Video,
      category: None,
      author: None,
      description: None,
      embed: Some("https://www.youtube.com/embed/x?autoplay=1".to_string()),
      featured: false,
    };
    assert!(m.playback_url().is_some());
    m.embed = Some(String::new());
    assert!(m.playback_url().is_none());
    m.embed = Some("https://www.youtube.com/embed/x".to_string());
    m.kind = MaterialKind::Pdf;
    assert!(m.playback_url().is_none());
  }
}
