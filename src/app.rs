use anyhow::Result;
use ratatui::{layout::Rect, widgets::ListState};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::constants::constants;
use crate::filter::{self, Entry};
use crate::loader::{LoadError, Source, load_materials, load_videos};
use crate::player::{NowPlaying, Player, open_external};
use crate::record::{Material, Record};
use crate::theme::{THEMES, Theme, theme_index};
use crate::ticker::AutoScroll;

// --- Types ---

pub type VideoLoad = Result<Vec<Record>, LoadError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum View {
  Videos,
  Materials,
}

impl View {
  pub fn label(self) -> &'static str {
    match self {
      View::Videos => "Video",
      View::Materials => "Materiali",
    }
  }

  pub fn other(self) -> Self {
    match self {
      View::Videos => View::Materials,
      View::Materials => View::Videos,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Browse,
  /// Editing the free-text query.
  Search,
  /// Editing the month filter (videos only).
  Month,
}

/// A single-line text field with a char-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
  pub text: String,
  pub cursor: usize,
  pub scroll: usize,
}

impl TextInput {
  pub fn clear(&mut self) {
    self.text.clear();
    self.cursor = 0;
    self.scroll = 0;
  }
}

pub struct App {
  pub config: Config,
  pub source: Source,
  pub view: View,
  pub mode: AppMode,
  pub theme_index: usize,
  pub videos: Catalog<Record>,
  pub materials: Catalog<Material>,
  pub featured: Vec<Material>,
  pub scroller: AutoScroll,
  /// Where the featured strip was last drawn, for hover detection.
  pub featured_area: Option<Rect>,
  hovering_featured: bool,
  pub list_state: ListState,
  pub search: TextInput,
  pub month: TextInput,
  /// Cursor over the available topic chips.
  pub chip_cursor: usize,
  pub player: Player,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  pub should_quit: bool,
  load_rx: Option<oneshot::Receiver<VideoLoad>>,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(config: Config, source: Source) -> Self {
    let c = constants();
    let locale = config.month_locale().to_string();
    Self {
      theme_index: theme_index(config.theme_name.as_deref()),
      config,
      source,
      view: View::Videos,
      mode: AppMode::Browse,
      videos: Catalog::new(&locale),
      materials: Catalog::new(&locale),
      featured: Vec::new(),
      scroller: AutoScroll::new(Duration::from_millis(c.scroll_interval_ms), c.scroll_step, c.scroll_edge_tolerance),
      featured_area: None,
      hovering_featured: false,
      list_state: ListState::default(),
      search: TextInput::default(),
      month: TextInput::default(),
      chip_cursor: 0,
      player: Player::new(),
      last_error: None,
      status_message: None,
      should_quit: false,
      load_rx: None,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static Theme {
    // Safety: theme_index is always bounded by modular arithmetic in next_theme()
    // and by theme_index() on initialization.
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages after 5 seconds.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(5)
    {
      self.clear_error();
    }
  }

  // --- View lifecycle ---

  /// Activate `view`: tear down the current one and load the new one once.
  pub async fn activate(&mut self, view: View) {
    self.deactivate().await;
    self.view = view;
    self.mode = AppMode::Browse;
    self.search.clear();
    self.month.clear();
    self.chip_cursor = 0;
    self.list_state.select(None);
    info!(view = view.label(), "app: view activated");
    match view {
      View::Videos => self.trigger_video_load(),
      View::Materials => {
        self.materials.begin_load();
        self.materials.finish_load(load_materials());
        self.featured = filter::featured(self.materials.records(), constants().featured_limit);
        self.hovering_featured = false;
        self.scroller.start(Duration::from_millis(constants().scroll_start_delay_ms));
        self.clamp_selection();
      }
    }
  }

  async fn deactivate(&mut self) {
    self.scroller.stop();
    self.featured_area = None;
    self.load_rx = None;
    if self.player.is_playing()
      && let Err(e) = self.player.stop().await
    {
      warn!(err = %e, "app: failed to stop player on view change");
    }
    self.videos.stop();
    self.materials.stop();
  }

  fn trigger_video_load(&mut self) {
    self.videos.begin_load();
    self.status_message = Some(format!("Caricamento da {}…", self.source));
    let source = self.source.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(load_videos(&source).await);
    });
    self.load_rx = Some(rx);
  }

  pub async fn shutdown(&mut self) {
    self.deactivate().await;
  }

  /// Poll background work: the video load, the player process and the featured strip ticker.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.load_rx.take() {
      match rx.try_recv() {
        Ok(result) => {
          self.status_message = None;
          self.videos.finish_load(result);
          if let Some(err) = self.videos.error().map(str::to_string) {
            self.set_error(format!("Caricamento fallito: {}", err));
          }
          self.clamp_selection();
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.load_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Load task failed.".to_string());
        }
      }
    }

    self.player.check_status();
    if self.player.reap_finished() {
      debug!(id = ?self.videos.playing().or(self.materials.playing()), "app: playback finished");
      self.videos.stop();
      self.materials.stop();
    }

    if self.view == View::Materials {
      self.scroller.drain();
    }
  }

  // --- Selection ---

  pub fn filtered_len(&self) -> usize {
    match self.view {
      View::Videos => self.videos.filtered().len(),
      View::Materials => self.materials.filtered().len(),
    }
  }

  /// Keep the list selection inside the filtered range.
  pub fn clamp_selection(&mut self) {
    let len = self.filtered_len();
    if len == 0 {
      self.list_state.select(None);
    } else {
      let sel = self.list_state.selected().unwrap_or(0);
      self.list_state.select(Some(sel.min(len - 1)));
    }
  }

  pub fn select_next(&mut self) {
    let count = self.filtered_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.filtered_len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  // --- Criteria ---

  pub fn apply_search(&mut self) {
    match self.view {
      View::Videos => self.videos.set_free_text(&self.search.text),
      View::Materials => self.materials.set_free_text(&self.search.text),
    }
    self.clamp_selection();
  }

  pub fn apply_month(&mut self) {
    if self.view == View::Videos {
      self.videos.set_month_text(&self.month.text);
      self.clamp_selection();
    }
  }

  pub fn cycle_sort(&mut self) {
    match self.view {
      View::Videos => self.videos.cycle_sort(),
      View::Materials => self.materials.cycle_sort(),
    }
  }

  pub fn clear_filters(&mut self) {
    self.search.clear();
    self.month.clear();
    match self.view {
      View::Videos => self.videos.clear_filters(),
      View::Materials => self.materials.clear_filters(),
    }
    self.clamp_selection();
  }

  /// Chips offered for the active view: topics for videos, flat tags for materials.
  pub fn available_chips(&self) -> Vec<String> {
    match self.view {
      View::Videos => filter::available_values(self.videos.records(), &constants().chip_group),
      View::Materials => filter::available_values(self.materials.records(), &constants().material_tag_group),
    }
  }

  pub fn chip_selected(&self, chip: &str) -> bool {
    match self.view {
      View::Videos => self.videos.criteria().chips.contains(chip),
      View::Materials => self
        .materials
        .criteria()
        .tag_selections
        .get(&constants().material_tag_group)
        .is_some_and(|selected| selected.contains(chip)),
    }
  }

  pub fn next_chip(&mut self) {
    let count = self.available_chips().len();
    if count > 0 {
      self.chip_cursor = (self.chip_cursor + 1) % count;
    }
  }

  /// Toggle the chip under the cursor. Video topics are alternatives; material tags must all match.
  pub fn toggle_current_chip(&mut self) {
    let Some(chip) = self.available_chips().get(self.chip_cursor).cloned() else { return };
    match self.view {
      View::Videos => self.videos.toggle_chip(&chip),
      View::Materials => self.materials.toggle_tag(&constants().material_tag_group, &chip),
    }
    self.clamp_selection();
  }

  /// Step to the next value of `current` in `options`, wrapping back to "no filter".
  fn cycle_option(current: Option<&str>, options: &[String]) -> Option<String> {
    match current.and_then(|c| options.iter().position(|o| o == c)) {
      None => options.first().cloned(),
      Some(i) => options.get(i + 1).cloned(),
    }
  }

  pub fn cycle_format(&mut self) {
    if self.view != View::Videos {
      return;
    }
    let options = filter::available_values(self.videos.records(), &constants().format_group);
    let next = Self::cycle_option(self.videos.criteria().format.as_deref(), &options);
    self.videos.set_format(next.as_deref());
    self.clamp_selection();
  }

  pub fn cycle_category(&mut self) {
    match self.view {
      View::Videos => {
        let options = filter::available_values(self.videos.records(), &constants().category_group);
        let next = Self::cycle_option(self.videos.criteria().category.as_deref(), &options);
        self.videos.set_category(next.as_deref());
      }
      View::Materials => {
        let options: Vec<String> =
          filter::available_categories(self.materials.records()).iter().map(ToString::to_string).collect();
        let next = Self::cycle_option(self.materials.criteria().category.as_deref(), &options);
        self.materials.set_category(next.as_deref());
      }
    }
    self.clamp_selection();
  }

  // --- Playback ---

  /// Play the selected video, or play/open the selected material.
  pub async fn activate_selected(&mut self) {
    let Some(idx) = self.list_state.selected() else { return };
    self.clear_error();
    match self.view {
      View::Videos => {
        let Some(record) = self.videos.filtered().get(idx).cloned() else { return };
        let url = record.playback_url(true);
        if url.is_empty() {
          self.set_error(format!("Nessun video riproducibile per \"{}\"", record.title));
          return;
        }
        if self.videos.play(&record) {
          self.start_player(NowPlaying { id: record.id, title: record.title, url }).await;
        }
      }
      View::Materials => {
        let Some(material) = self.materials.filtered().get(idx).cloned() else { return };
        if material.playable() {
          let url = material.playback_url().map(str::to_string).unwrap_or_default();
          if self.materials.play(&material) {
            self.start_player(NowPlaying { id: material.record.id, title: material.record.title, url }).await;
          }
        } else if let Some(url) = material.record.url.as_deref() {
          if let Err(e) = open_external(url) {
            self.set_error(format!("{:#}", e));
          }
        } else {
          debug!(id = material.record.id, "app: material has nothing to open");
        }
      }
    }
  }

  async fn start_player(&mut self, item: NowPlaying) {
    if let Err(e) = self.player.play(item).await {
      self.set_error(format!("Errore di riproduzione: {:#}", e));
      self.videos.stop();
      self.materials.stop();
    }
  }

  pub async fn stop_playback(&mut self) -> Result<()> {
    self.videos.stop();
    self.materials.stop();
    self.player.stop().await
  }

  /// Open the selected entry's source URL externally.
  pub fn open_selected(&mut self) {
    let Some(idx) = self.list_state.selected() else { return };
    let url = match self.view {
      View::Videos => self.videos.filtered().get(idx).and_then(|r| r.url.clone()),
      View::Materials => self.materials.filtered().get(idx).and_then(|m| m.record.url.clone()),
    };
    if let Some(url) = url
      && let Err(e) = open_external(&url)
    {
      self.set_error(format!("{:#}", e));
    }
  }

  // --- Featured strip ---

  /// Pause the strip while the pointer is over it, resume when it leaves.
  pub fn pointer_moved(&mut self, column: u16, row: u16) {
    if self.view != View::Materials {
      return;
    }
    let inside = self.featured_area.is_some_and(|a| {
      column >= a.x && column < a.x.saturating_add(a.width) && row >= a.y && row < a.y.saturating_add(a.height)
    });
    if inside && !self.hovering_featured {
      self.hovering_featured = true;
      self.scroller.stop();
    } else if !inside && self.hovering_featured {
      self.hovering_featured = false;
      self.scroller.start(Duration::ZERO);
    }
  }

  pub fn hovering_featured(&self) -> bool {
    self.hovering_featured
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> App {
    App::new(Config::default(), Source::parse("missing.json"))
  }

  #[test]
  fn cycle_option_walks_and_wraps_to_none() {
    let options = vec!["pdf".to_string(), "video".to_string()];
    assert_eq!(App::cycle_option(None, &options).as_deref(), Some("pdf"));
    assert_eq!(App::cycle_option(Some("pdf"), &options).as_deref(), Some("video"));
    assert_eq!(App::cycle_option(Some("video"), &options), None);
    assert_eq!(App::cycle_option(Some("gone"), &options).as_deref(), Some("pdf"));
    assert_eq!(App::cycle_option(None, &[]), None);
  }

  #[test]
  fn view_toggles() {
    assert_eq!(View::Videos.other(), View::Materials);
    assert_eq!(View::Materials.other(), View::Videos);
  }

  #[tokio::test]
  async fn materials_view_loads_synchronously_and_starts_ticker() {
    let mut app = app();
    app.activate(View::Materials).await;
    assert!(!app.materials.filtered().is_empty());
    assert!(!app.featured.is_empty());
    assert!(app.scroller.is_running());
    assert_eq!(app.list_state.selected(), Some(0));
    app.shutdown().await;
    assert!(!app.scroller.is_running());
  }

  #[tokio::test]
  async fn hover_pauses_and_resumes_ticker() {
    let mut app = app();
    app.activate(View::Materials).await;
    app.featured_area = Some(Rect { x: 0, y: 2, width: 40, height: 5 });
    app.pointer_moved(5, 3);
    assert!(app.hovering_featured());
    assert!(!app.scroller.is_running());
    app.pointer_moved(5, 20);
    assert!(!app.hovering_featured());
    assert!(app.scroller.is_running());
    app.shutdown().await;
  }

  #[tokio::test]
  async fn failed_video_load_surfaces_error() {
    let mut app = app();
    app.activate(View::Videos).await;
    assert!(app.videos.phase().is_loading());
    for _ in 0..100 {
      app.check_pending();
      if !app.videos.phase().is_loading() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(app.videos.error().is_some());
    assert!(app.videos.filtered().is_empty());
    assert!(app.last_error.is_some());
    assert_eq!(app.list_state.selected(), None);
  }

  #[tokio::test]
  async fn material_tag_chips_narrow_the_list() {
    let mut app = app();
    app.activate(View::Materials).await;
    let chips = app.available_chips();
    app.chip_cursor = chips.iter().position(|c| c == "USA").unwrap();
    app.toggle_current_chip();
    assert!(app.chip_selected("USA"));
    assert_eq!(app.materials.filtered().iter().map(|m| m.record.id).collect::<Vec<_>>(), [2]);
    app.toggle_current_chip();
    assert!(!app.chip_selected("USA"));
    app.shutdown().await;
  }

  #[tokio::test]
  async fn switching_views_tears_down_materials_ticker() {
    let mut app = app();
    app.activate(View::Materials).await;
    app.activate(View::Videos).await;
    assert!(!app.scroller.is_running());
    assert_eq!(app.view, View::Videos);
  }

  #[tokio::test]
  async fn non_playable_material_does_not_change_selection() {
    let mut app = app();
    app.activate(View::Materials).await;
    app.materials.set_category(Some("teoria"));
    app.clamp_selection();
    let pdf = app.materials.filtered()[0].clone();
    assert!(!app.materials.play(&pdf));
    assert_eq!(app.materials.playing(), None);
    app.shutdown().await;
  }
}
