use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, AppMode, View};
use crate::constants::constants;
use crate::record::{Material, Record};
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// Truncate and right-pad to exactly `width` columns.
fn pad_to(s: &str, width: usize) -> String {
  let mut out = truncate_str(s, width);
  let w = display_width(&out, usize::MAX);
  if w < width {
    out.push_str(&" ".repeat(width - w));
  }
  out
}

fn rounded(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

/// Title plus the right-aligned metadata shown for one list row.
struct Row {
  title: String,
  meta: String,
  playing: bool,
}

fn video_row(r: &Record, playing: bool) -> Row {
  let topics = r.tags.values(&constants().chip_group).join(", ");
  let meta = if topics.is_empty() { r.date.clone() } else { format!("{}  {}", topics, r.date) };
  Row { title: r.title.clone(), meta, playing }
}

fn material_row(m: &Material, playing: bool) -> Row {
  let mut meta: Vec<&str> = Vec::new();
  if let Some(c) = m.category {
    meta.push(c.label());
  }
  if let Some(a) = m.author.as_deref() {
    meta.push(a);
  }
  meta.push(&m.record.date);
  Row {
    title: format!("[{}] {}", m.kind.label(), m.record.title),
    meta: meta.join("  "),
    playing,
  }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let strip_height = if app.view == View::Materials && !app.featured.is_empty() { 5 } else { 0 };
  let [header_area, filter_area, strip_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Length(strip_height),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, app, header_area);
  render_filters(frame, app, filter_area);
  if strip_height > 0 {
    render_featured(frame, app, strip_area);
  } else {
    app.featured_area = None;
  }
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let site = &app.config.site;
  let mut spans = vec![
    Span::styled(format!(" ▶ {} ", site.title), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)),
    Span::styled(format!("· {} ", site.author), Style::default().fg(theme.muted)),
  ];
  for view in [View::Videos, View::Materials] {
    let style = if view == app.view {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::raw(" "));
    spans.push(Span::styled(format!(" {} ", view.label()), style));
  }
  frame.render_widget(Line::from(spans), area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_filters(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let label = Style::default().fg(theme.muted);
  let value = Style::default().fg(theme.fg);
  let criteria = match app.view {
    View::Videos => app.videos.criteria(),
    View::Materials => app.materials.criteria(),
  };

  let mut spans = vec![Span::styled(" ordine ", label), Span::styled(criteria.sort.label(), value)];
  if !criteria.month_text.is_empty() {
    spans.push(Span::styled("  mese ", label));
    spans.push(Span::styled(criteria.month_text.as_str(), value));
  }
  if let Some(format) = criteria.format.as_deref() {
    spans.push(Span::styled("  formato ", label));
    spans.push(Span::styled(format, value));
  }
  if let Some(category) = criteria.category.as_deref() {
    spans.push(Span::styled("  categoria ", label));
    spans.push(Span::styled(category, value));
  }

  if criteria.is_unfiltered() {
    spans.push(Span::styled("  nessun filtro", label));
  }

  let chips = app.available_chips();
  if !chips.is_empty() {
    spans.push(Span::styled("  │", label));
  }
  for (i, chip) in chips.iter().enumerate() {
    let on = app.chip_selected(chip);
    let mut style = if on { Style::default().fg(theme.chip_on).add_modifier(Modifier::BOLD) } else { label };
    if i == app.chip_cursor {
      style = style.add_modifier(Modifier::UNDERLINED);
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled(if on { format!("●{}", chip) } else { chip.clone() }, style));
  }

  frame.render_widget(Line::from(spans), area);
}

fn render_featured(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let card_w = constants().featured_card_width as usize;
  let paused = if app.hovering_featured() { " (pausa)" } else { "" };
  let block = rounded(theme)
    .title(format!(" In evidenza{} ", paused))
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));
  let inner = block.inner(area);

  let mut titles = Vec::new();
  let mut details = Vec::new();
  let mut authors = Vec::new();
  for m in &app.featured {
    let playing = app.materials.is_playing(m.record.id);
    let title_style = if playing {
      Style::default().fg(theme.chip_on).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD)
    };
    let detail = format!("{} · {}", m.kind.label(), m.record.date);
    titles.push(Span::styled(pad_to(&format!(" {}", m.record.title), card_w), title_style));
    details.push(Span::styled(pad_to(&format!(" {}", detail), card_w), Style::default().fg(theme.muted)));
    authors.push(Span::styled(
      pad_to(&format!(" {}", m.author.as_deref().unwrap_or("")), card_w),
      Style::default().fg(theme.muted),
    ));
  }

  let content = (card_w * app.featured.len()).min(u16::MAX as usize) as u16;
  app.scroller.state.set_bounds(content, inner.width);
  let offset = app.scroller.state.offset;

  let paragraph =
    Paragraph::new(vec![Line::from(titles), Line::from(details), Line::from(authors)]).scroll((0, offset)).block(block);
  frame.render_widget(paragraph, area);
  app.featured_area = Some(area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let (loading, error, total) = match app.view {
    View::Videos => {
      (app.videos.phase().is_loading(), app.videos.error().map(str::to_string), app.videos.records().len())
    }
    View::Materials => {
      (app.materials.phase().is_loading(), app.materials.error().map(str::to_string), app.materials.records().len())
    }
  };

  if loading {
    render_message(frame, theme, area, "Caricamento…", theme.muted);
  } else if let Some(msg) = error {
    render_message(frame, theme, area, &format!("Errore: {}", msg), theme.error);
  } else if app.filtered_len() == 0 {
    let text = if total == 0 { "Nessun contenuto." } else { "Nessun risultato per i filtri attivi." };
    render_message(frame, theme, area, text, theme.muted);
  } else {
    render_list(frame, app, area, total);
  }
}

fn render_message(frame: &mut Frame, theme: &Theme, area: Rect, text: &str, color: ratatui::style::Color) {
  let lines = vec![Line::from(""), Line::from(Span::styled(text.to_string(), Style::default().fg(color)))];
  frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center).block(rounded(theme)), area);
}

fn render_list(frame: &mut Frame, app: &mut App, area: Rect, total: usize) {
  let theme = app.theme();

  let rows: Vec<Row> = match app.view {
    View::Videos => app.videos.filtered().iter().map(|r| video_row(r, app.videos.is_playing(r.id))).collect(),
    View::Materials => {
      app.materials.filtered().iter().map(|m| material_row(m, app.materials.is_playing(m.record.id))).collect()
    }
  };

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;

  let items: Vec<ListItem> = rows
    .iter()
    .enumerate()
    .map(|(i, row)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected {
        theme.highlight_fg
      } else if row.playing {
        theme.chip_on
      } else {
        theme.fg
      };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let marker = if row.playing { "♪ " } else { "" };
      let right_w = row.meta.chars().count();
      let title_max = inner_w.saturating_sub(right_w + 2 + marker.len());
      let title = format!("{}{}", marker, truncate_str(&row.title, title_max));
      let gap = inner_w.saturating_sub(title.chars().count() + right_w);

      let line = Line::from(vec![
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(row.meta.clone(), Style::default().fg(if is_selected { theme.highlight_fg } else { theme.muted })),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = format!(" {} ({}/{}) ", app.view.label(), rows.len(), total);
  let list = List::new(items)
    .block(rounded(theme).title(title).title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(now) = &app.player.now_playing {
    let status = app.player.last_status().unwrap_or("");
    (format!(" ♪ {}  {}", now.title, status), Style::default().fg(theme.status))
  } else {
    (format!(" {}", app.config.site.description), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let editing = app.mode != AppMode::Browse;
  let title = if app.mode == AppMode::Month { " Mese (es. giugno) " } else { " Cerca " };
  let border_color = if editing { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(title)
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let input = if app.mode == AppMode::Month { &mut app.month } else { &mut app.search };
  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&input.text, input.cursor);

  if cursor_col < input.scroll {
    input.scroll = cursor_col;
  } else if cursor_col >= input.scroll + inner_w {
    input.scroll = cursor_col.saturating_sub(inner_w) + 1;
  }
  let scroll = input.scroll;

  let visible: String = input
    .text
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= scroll)
    .take_while(|(start, _, _)| *start < scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  if editing {
    let cursor_x = area.x + 2 + (cursor_col - scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let is_playing = app.player.is_playing();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Search | AppMode::Month => vec![("Enter", "Applica"), ("↑/↓", "Scorri"), ("Esc", "Annulla")],
    AppMode::Browse => {
      let mut k = vec![("Enter", "Apri"), ("Tab", "Vista"), ("/", "Cerca")];
      if app.view == View::Videos {
        k.push(("m", "Mese"));
        k.push(("f", "Formato"));
      }
      k.push(("a/Spazio", "Tag"));
      k.push(("c", "Categoria"));
      k.push(("s", "Ordine"));
      k.push(("x", "Azzera"));
      if is_playing {
        k.push(("^s", "Stop"));
      }
      k.push(("^o", "Link"));
      k.push(("^t", "Tema"));
      k.push(("Esc", "Esci"));
      k
    }
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw(" "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::TagMap;

  #[test]
  fn truncate_keeps_short_strings() {
    assert_eq!(truncate_str("abc", 5), "abc");
    assert_eq!(truncate_str("abcdef", 4), "abc…");
  }

  #[test]
  fn display_width_counts_wide_chars() {
    assert_eq!(display_width("ab", 2), 2);
    assert_eq!(display_width("日本", 2), 4);
    assert_eq!(display_width("日本", 1), 2);
  }

  #[test]
  fn pad_to_fills_and_truncates() {
    assert_eq!(pad_to("ab", 4), "ab  ");
    assert_eq!(pad_to("abcdef", 4), "abc…");
    assert_eq!(pad_to("", 2), "  ");
  }

  #[test]
  fn video_row_lists_topics_then_date() {
    let r = Record {
      id: 7,
      title: "Limes".to_string(),
      date: "2024-05-01".to_string(),
      url: None,
      tags: TagMap::with_group("argomento", ["Russia", "USA"]),
      poster: None,
    };
    let row = video_row(&r, true);
    assert_eq!(row.meta, "Russia, USA  2024-05-01");
    assert_eq!(row.title, "Limes");
  }

  #[test]
  fn material_row_shows_kind_and_author() {
    let m = crate::materials::builtin().into_iter().next().unwrap();
    let row = material_row(&m, false);
    assert!(row.title.starts_with("[pdf] "));
    assert!(row.meta.contains("Karl Marx"));
  }
}
