use tracing::{debug, info, warn};

use crate::filter::{self, Criteria, Entry, SortMode};
use crate::loader::{LoadError, LoadPhase};
use crate::playback::PlaybackSelector;

/// State of one catalog view: the loaded set, the active criteria, the filtered result and playback.
///
/// The filtered list is recomputed explicitly after every change to records or criteria.
#[derive(Debug, Clone)]
pub struct Catalog<T: Entry> {
  phase: LoadPhase,
  records: Vec<T>,
  criteria: Criteria,
  filtered: Vec<T>,
  playback: PlaybackSelector,
}

impl<T: Entry> Catalog<T> {
  pub fn new(locale: &str) -> Self {
    Self {
      phase: LoadPhase::Loading,
      records: Vec::new(),
      criteria: Criteria { locale: locale.to_string(), ..Criteria::default() },
      filtered: Vec::new(),
      playback: PlaybackSelector::default(),
    }
  }

  pub fn phase(&self) -> &LoadPhase {
    &self.phase
  }

  pub fn error(&self) -> Option<&str> {
    self.phase.error()
  }

  pub fn records(&self) -> &[T] {
    &self.records
  }

  pub fn filtered(&self) -> &[T] {
    &self.filtered
  }

  pub fn criteria(&self) -> &Criteria {
    &self.criteria
  }

  pub fn playing(&self) -> Option<u64> {
    self.playback.playing()
  }

  pub fn is_playing(&self, id: u64) -> bool {
    self.playback.is_playing(id)
  }

  // --- Loading ---

  /// Reset to the loading phase. Filter criteria and playback return to their defaults.
  pub fn begin_load(&mut self) {
    self.phase = LoadPhase::Loading;
    self.records.clear();
    self.criteria.clear_filters();
    self.criteria.sort = SortMode::default();
    self.playback.stop();
    self.refilter();
  }

  /// Install the outcome of a load. A failed load leaves no records behind.
  pub fn finish_load(&mut self, result: Result<Vec<T>, LoadError>) {
    match result {
      Ok(records) => {
        info!(count = records.len(), "catalog: records ready");
        self.records = records;
        self.phase = LoadPhase::Ready;
      }
      Err(e) => {
        warn!(err = %e, "catalog: load failed");
        self.records.clear();
        self.phase = LoadPhase::Failed(e.to_string());
      }
    }
    self.refilter();
  }

  /// Recompute the filtered list from the records and criteria.
  pub fn refilter(&mut self) {
    self.filtered = filter::apply(&self.records, &self.criteria);
    debug!(total = self.records.len(), shown = self.filtered.len(), "catalog: refiltered");
  }

  // --- Criteria ---

  pub fn set_free_text(&mut self, text: &str) {
    self.criteria.free_text = text.to_string();
    self.refilter();
  }

  pub fn set_month_text(&mut self, text: &str) {
    self.criteria.month_text = text.to_string();
    self.refilter();
  }

  pub fn toggle_tag(&mut self, group: &str, value: &str) {
    self.criteria.toggle_tag(group, value);
    self.refilter();
  }

  pub fn set_format(&mut self, format: Option<&str>) {
    self.criteria.format = format.map(str::to_string);
    self.refilter();
  }

  pub fn set_category(&mut self, category: Option<&str>) {
    self.criteria.category = category.map(str::to_string);
    self.refilter();
  }

  pub fn toggle_chip(&mut self, value: &str) {
    self.criteria.toggle_chip(value);
    self.refilter();
  }

  pub fn set_sort(&mut self, sort: SortMode) {
    self.criteria.sort = sort;
    self.refilter();
  }

  pub fn cycle_sort(&mut self) {
    self.set_sort(self.criteria.sort.next());
  }

  pub fn clear_filters(&mut self) {
    self.criteria.clear_filters();
    self.refilter();
  }

  // --- Playback ---

  /// Select `entry` for playback. Returns whether the playing entry changed.
  pub fn play(&mut self, entry: &T) -> bool {
    self.playback.play(entry)
  }

  pub fn stop(&mut self) {
    self.playback.stop();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::{Record, TagMap};

  fn record(id: u64, date: &str, argomento: &[&str]) -> Record {
    Record {
      id,
      title: format!("video {}", id),
      date: date.to_string(),
      url: Some(format!("https://youtu.be/v{}", id)),
      tags: TagMap::with_group("argomento", argomento.iter().copied()),
      poster: None,
    }
  }

  fn loaded() -> Catalog<Record> {
    let mut c = Catalog::new("it");
    c.finish_load(Ok(vec![
      record(1, "2024-01-01", &["Russia"]),
      record(2, "2024-06-01", &["Cina"]),
      record(3, "2023-06-01", &["Russia", "USA"]),
    ]));
    c
  }

  #[test]
  fn starts_loading_with_nothing_shown() {
    let c: Catalog<Record> = Catalog::new("it");
    assert!(c.phase().is_loading());
    assert!(c.error().is_none());
    assert!(c.filtered().is_empty());
  }

  #[test]
  fn empty_load_is_ready_without_error() {
    let mut c: Catalog<Record> = Catalog::new("it");
    c.finish_load(Ok(Vec::new()));
    assert_eq!(c.phase(), &LoadPhase::Ready);
    assert!(c.error().is_none());
    assert!(c.filtered().is_empty());
  }

  #[test]
  fn failed_load_has_error_and_no_records() {
    let mut c: Catalog<Record> = Catalog::new("it");
    let err = serde_json::from_str::<Vec<u32>>("nope").unwrap_err();
    c.finish_load(Err(LoadError::Parse(err)));
    assert!(!c.phase().is_loading());
    assert!(c.error().is_some());
    assert!(c.filtered().is_empty());
    assert!(c.records().is_empty());
  }

  #[test]
  fn mutations_refilter_immediately() {
    let mut c = loaded();
    assert_eq!(c.filtered().len(), 3);
    c.toggle_chip("Russia");
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [1, 3]);
    c.set_free_text("usa");
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [3]);
    c.clear_filters();
    assert_eq!(c.filtered().len(), 3);
  }

  #[test]
  fn sort_cycles_through_modes() {
    let mut c = loaded();
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [2, 1, 3]);
    c.cycle_sort();
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [3, 1, 2]);
    c.cycle_sort();
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [1, 2, 3]);
  }

  #[test]
  fn month_filter_uses_configured_locale() {
    let mut c = loaded();
    c.set_month_text("giugno");
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [2, 3]);
  }

  #[test]
  fn tag_toggle_requires_every_selected_value() {
    let mut c = loaded();
    c.toggle_tag("argomento", "Russia");
    c.toggle_tag("argomento", "USA");
    assert_eq!(c.filtered().iter().map(|r| r.id).collect::<Vec<_>>(), [3]);
  }

  #[test]
  fn play_and_stop() {
    let mut c = loaded();
    let first = c.filtered()[0].clone();
    let second = c.filtered()[1].clone();
    assert!(c.play(&first));
    assert!(c.play(&second));
    assert_eq!(c.playing(), Some(second.id));
    assert!(c.is_playing(second.id));
    assert!(!c.is_playing(first.id));
    c.stop();
    c.stop();
    assert_eq!(c.playing(), None);
  }

  #[test]
  fn reload_resets_state() {
    let mut c = loaded();
    c.toggle_chip("Cina");
    let first = c.filtered()[0].clone();
    c.play(&first);
    c.begin_load();
    assert!(c.phase().is_loading());
    assert!(c.criteria().is_unfiltered());
    assert_eq!(c.playing(), None);
    assert!(c.filtered().is_empty());
  }
}
