use chrono::{Locale, NaiveDate};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::constants::constants;
use crate::record::{Category, Material, Record, TagMap, month_locale, month_name};

/// Date ordering of a filtered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortMode {
  #[default]
  Newest,
  Oldest,
  /// Keep the source order.
  Unordered,
}

impl SortMode {
  pub const ALL: [SortMode; 3] = [SortMode::Newest, SortMode::Oldest, SortMode::Unordered];

  pub fn label(self) -> &'static str {
    match self {
      SortMode::Newest => "newest",
      SortMode::Oldest => "oldest",
      SortMode::Unordered => "unordered",
    }
  }

  pub fn next(self) -> Self {
    let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }
}

/// Active filter and sort selections. Empty fields impose no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Criteria {
  pub free_text: String,
  pub month_text: String,
  /// Per tag group, values that must all be present on a record.
  pub tag_selections: BTreeMap<String, BTreeSet<String>>,
  pub format: Option<String>,
  pub category: Option<String>,
  /// Topic chips: a record passes when it carries at least one of them.
  pub chips: BTreeSet<String>,
  pub sort: SortMode,
  /// Locale tag used to render month names for `month_text` (see [`month_locale`]).
  pub locale: String,
}

impl Criteria {
  /// Flip one value of a tag group selection. Groups left empty are dropped.
  pub fn toggle_tag(&mut self, group: &str, value: &str) {
    let selected = self.tag_selections.entry(group.to_string()).or_default();
    if !selected.remove(value) {
      selected.insert(value.to_string());
    }
    if selected.is_empty() {
      self.tag_selections.remove(group);
    }
  }

  pub fn toggle_chip(&mut self, value: &str) {
    if !self.chips.remove(value) {
      self.chips.insert(value.to_string());
    }
  }

  /// Reset every filter, keeping the sort mode and locale.
  pub fn clear_filters(&mut self) {
    *self = Criteria { sort: self.sort, locale: std::mem::take(&mut self.locale), ..Criteria::default() };
  }

  pub fn is_unfiltered(&self) -> bool {
    self.free_text.is_empty()
      && self.month_text.is_empty()
      && self.tag_selections.values().all(BTreeSet::is_empty)
      && self.format.as_deref().is_none_or(str::is_empty)
      && self.category.as_deref().is_none_or(str::is_empty)
      && self.chips.is_empty()
  }
}

/// Something the filter pipeline can select and order.
pub trait Entry: Clone {
  fn id(&self) -> u64;
  fn date(&self) -> Option<NaiveDate>;
  fn tags(&self) -> &TagMap;
  /// Text matched by the free-text query.
  fn search_text(&self) -> String;
  fn matches_category(&self, category: &str) -> bool;
  /// Whether the entry can be played inline.
  fn playable(&self) -> bool;

  /// Localized month name of the entry's date.
  fn month_name(&self, locale: Locale) -> Option<String> {
    self.date().map(|d| month_name(d, locale))
  }
}

impl Entry for Record {
  fn id(&self) -> u64 {
    self.id
  }

  fn date(&self) -> Option<NaiveDate> {
    self.parsed_date()
  }

  fn tags(&self) -> &TagMap {
    &self.tags
  }

  fn search_text(&self) -> String {
    let tags = self.tags.all_values().collect::<Vec<_>>().join(" ");
    format!("{} {}", self.title, tags)
  }

  fn matches_category(&self, category: &str) -> bool {
    self.tags.contains_ci(&constants().category_group, category)
  }

  fn playable(&self) -> bool {
    true
  }
}

impl Entry for Material {
  fn id(&self) -> u64 {
    self.record.id
  }

  fn date(&self) -> Option<NaiveDate> {
    self.record.parsed_date()
  }

  fn tags(&self) -> &TagMap {
    &self.record.tags
  }

  fn search_text(&self) -> String {
    let mut parts = vec![self.record.title.as_str()];
    parts.extend(self.description.as_deref());
    parts.extend(self.author.as_deref());
    parts.extend(self.record.tags.all_values());
    parts.join(" ")
  }

  fn matches_category(&self, category: &str) -> bool {
    self.category.is_some_and(|c| c.label() == category)
  }

  fn playable(&self) -> bool {
    self.playback_url().is_some()
  }
}

/// A blank query matches everything; otherwise the query is matched verbatim, surrounding spaces included.
fn matches_text<T: Entry>(item: &T, query: &str) -> bool {
  query.trim().is_empty() || item.search_text().to_lowercase().contains(&query.to_lowercase())
}

fn matches_month<T: Entry>(item: &T, month_text: &str, locale: Locale) -> bool {
  if month_text.trim().is_empty() {
    return true;
  }
  let needle = month_text.to_lowercase();
  item.month_name(locale).is_some_and(|m| m.to_lowercase().contains(&needle))
}

/// Every selected value of every group must be present on the item.
fn matches_tag_selections<T: Entry>(item: &T, selections: &BTreeMap<String, BTreeSet<String>>) -> bool {
  selections.iter().all(|(group, selected)| selected.iter().all(|value| item.tags().contains_ci(group, value)))
}

fn matches_chips<T: Entry>(item: &T, chips: &BTreeSet<String>) -> bool {
  let group = &constants().chip_group;
  chips.is_empty() || chips.iter().any(|chip| item.tags().contains_ci(group, chip))
}

/// A single-valued filter counts only when set to a non-empty value.
fn active(value: &Option<String>) -> Option<&str> {
  value.as_deref().filter(|v| !v.is_empty())
}

/// Whether `item` passes every active filter in `criteria`.
pub fn matches<T: Entry>(item: &T, criteria: &Criteria) -> bool {
  let locale = month_locale(&criteria.locale);
  matches_text(item, &criteria.free_text)
    && matches_month(item, &criteria.month_text, locale)
    && matches_tag_selections(item, &criteria.tag_selections)
    && active(&criteria.format).is_none_or(|f| item.tags().contains_ci(&constants().format_group, f))
    && active(&criteria.category).is_none_or(|c| item.matches_category(c))
    && matches_chips(item, &criteria.chips)
}

/// Compare optional dates; entries without a valid date go last in either direction.
fn compare_dates(a: Option<NaiveDate>, b: Option<NaiveDate>, newest_first: bool) -> Ordering {
  match (a, b) {
    (Some(a), Some(b)) if newest_first => b.cmp(&a),
    (Some(a), Some(b)) => a.cmp(&b),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => Ordering::Equal,
  }
}

/// Stable in-place sort by date.
pub fn sort_by_date<T: Entry>(items: &mut [T], mode: SortMode) {
  let newest_first = match mode {
    SortMode::Newest => true,
    SortMode::Oldest => false,
    SortMode::Unordered => return,
  };
  items.sort_by(|a, b| compare_dates(a.date(), b.date(), newest_first));
}

/// Filter `items` by `criteria`, then order them by date.
///
/// Pure and idempotent: `apply(&apply(r, c), c) == apply(r, c)`.
pub fn apply<T: Entry>(items: &[T], criteria: &Criteria) -> Vec<T> {
  let mut out: Vec<T> = items.iter().filter(|item| matches(*item, criteria)).cloned().collect();
  sort_by_date(&mut out, criteria.sort);
  out
}

/// Distinct values of a tag group across `items`, sorted.
pub fn available_values<T: Entry>(items: &[T], group: &str) -> Vec<String> {
  items.iter().flat_map(|item| item.tags().values(group).iter().cloned()).collect::<BTreeSet<_>>().into_iter().collect()
}

/// Distinct material categories in first-seen order.
pub fn available_categories(materials: &[Material]) -> Vec<Category> {
  let mut out = Vec::new();
  for c in materials.iter().filter_map(|m| m.category) {
    if !out.contains(&c) {
      out.push(c);
    }
  }
  out
}

/// Featured materials, newest first, at most `limit` of them.
pub fn featured(materials: &[Material], limit: usize) -> Vec<Material> {
  let mut out: Vec<Material> = materials.iter().filter(|m| m.featured).cloned().collect();
  sort_by_date(&mut out, SortMode::Newest);
  out.truncate(limit);
  out
}
