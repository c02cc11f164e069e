use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode, TextInput, View};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Apply an editing key to `input`. Returns whether the text changed.
fn edit_text(input: &mut TextInput, code: KeyCode) -> bool {
  match code {
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&input.text, input.cursor);
      input.text.insert(byte_idx, c);
      input.cursor += 1;
      true
    }
    KeyCode::Backspace => {
      if input.cursor > 0 {
        input.cursor -= 1;
        let byte_idx = char_to_byte_index(&input.text, input.cursor);
        input.text.remove(byte_idx);
        true
      } else {
        false
      }
    }
    KeyCode::Delete => {
      if input.cursor < input.text.chars().count() {
        let byte_idx = char_to_byte_index(&input.text, input.cursor);
        input.text.remove(byte_idx);
        true
      } else {
        false
      }
    }
    KeyCode::Left => {
      input.cursor = input.cursor.saturating_sub(1);
      false
    }
    KeyCode::Right => {
      if input.cursor < input.text.chars().count() {
        input.cursor += 1;
      }
      false
    }
    KeyCode::Home => {
      input.cursor = 0;
      false
    }
    KeyCode::End => {
      input.cursor = input.text.chars().count();
      false
    }
    _ => false,
  }
}

// --- Event Handling ---

pub async fn handle_key_event(app: &mut App, key: event::KeyEvent) -> Result<()> {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => app.should_quit = true,
      KeyCode::Char('t') => app.next_theme(),
      KeyCode::Char('s') => app.stop_playback().await.context("Failed to stop playback")?,
      KeyCode::Char('o') => app.open_selected(),
      _ => {}
    }
    return Ok(());
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key).await,
    AppMode::Search => handle_search_key(app, key),
    AppMode::Month => handle_month_key(app, key),
  }
  Ok(())
}

async fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Tab => {
      let next = app.view.other();
      app.activate(next).await;
    }
    KeyCode::Enter => app.activate_selected().await,
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
    KeyCode::Char('/') => {
      app.clear_error();
      app.mode = AppMode::Search;
    }
    KeyCode::Char('m') if app.view == View::Videos => {
      app.clear_error();
      app.mode = AppMode::Month;
    }
    KeyCode::Char('s') => app.cycle_sort(),
    KeyCode::Char('f') => app.cycle_format(),
    KeyCode::Char('c') => app.cycle_category(),
    KeyCode::Char('a') => app.next_chip(),
    KeyCode::Char(' ') => app.toggle_current_chip(),
    KeyCode::Char('x') => app.clear_filters(),
    KeyCode::Char('r') => app.activate(app.view).await,
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_search_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.mode = AppMode::Browse,
    KeyCode::Esc => {
      app.search.clear();
      app.apply_search();
      app.mode = AppMode::Browse;
    }
    KeyCode::Down => app.select_next(),
    KeyCode::Up => app.select_prev(),
    code => {
      if edit_text(&mut app.search, code) {
        app.apply_search();
      }
    }
  }
}

fn handle_month_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.mode = AppMode::Browse,
    KeyCode::Esc => {
      app.month.clear();
      app.apply_month();
      app.mode = AppMode::Browse;
    }
    KeyCode::Down => app.select_next(),
    KeyCode::Up => app.select_prev(),
    code => {
      if edit_text(&mut app.month, code) {
        app.apply_month();
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::loader::Source;
  use ratatui::crossterm::event::KeyEvent;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 0), 0);
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 0), 0);
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- edit_text ---

  #[test]
  fn edit_inserts_and_deletes_at_cursor() {
    let mut input = TextInput::default();
    for c in "città".chars() {
      assert!(edit_text(&mut input, KeyCode::Char(c)));
    }
    assert_eq!(input.text, "città");
    assert!(!edit_text(&mut input, KeyCode::Left));
    assert!(edit_text(&mut input, KeyCode::Backspace));
    assert_eq!(input.text, "cità");
    assert!(!edit_text(&mut input, KeyCode::Home));
    assert!(!edit_text(&mut input, KeyCode::Backspace));
    assert!(edit_text(&mut input, KeyCode::Delete));
    assert_eq!(input.text, "ità");
    assert!(!edit_text(&mut input, KeyCode::End));
    assert!(!edit_text(&mut input, KeyCode::Delete));
  }

  // --- key routing ---

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  #[tokio::test]
  async fn search_mode_filters_live_and_esc_clears() {
    let mut app = App::new(Config::default(), Source::parse("missing.json"));
    app.activate(View::Materials).await;
    let total = app.filtered_len();
    handle_key_event(&mut app, key(KeyCode::Char('/'))).await.unwrap();
    assert_eq!(app.mode, AppMode::Search);
    for c in "trasimaco".chars() {
      handle_key_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
    }
    assert_eq!(app.filtered_len(), 1);
    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert_eq!(app.mode, AppMode::Browse);
    assert_eq!(app.filtered_len(), total);
    app.shutdown().await;
  }

  #[tokio::test]
  async fn month_mode_is_videos_only() {
    let mut app = App::new(Config::default(), Source::parse("missing.json"));
    app.activate(View::Materials).await;
    handle_key_event(&mut app, key(KeyCode::Char('m'))).await.unwrap();
    assert_eq!(app.mode, AppMode::Browse);
    app.shutdown().await;
  }

  #[tokio::test]
  async fn ctrl_c_and_esc_quit() {
    let mut app = App::new(Config::default(), Source::parse("missing.json"));
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).await.unwrap();
    assert!(app.should_quit);
    let mut app = App::new(Config::default(), Source::parse("missing.json"));
    handle_key_event(&mut app, key(KeyCode::Esc)).await.unwrap();
    assert!(app.should_quit);
  }
}
