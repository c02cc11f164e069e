mod app;
mod catalog;
mod config;
mod constants;
mod filter;
mod input;
mod loader;
mod materials;
mod playback;
mod player;
mod record;
mod theme;
mod ticker;
mod ui;
mod youtube;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand};
use ratatui::{
  DefaultTerminal,
  crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind},
    execute,
  },
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::{App, View};
use config::Config;
use filter::{Criteria, SortMode};
use loader::{Source, load_materials, load_videos};
use record::Category;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Video list: a local JSON file or an http(s) URL (default: config, then assets/videos.json)
  #[arg(short, long, global = true)]
  source: Option<String>,

  /// View to open first
  #[arg(long, value_enum, default_value = "videos")]
  view: View,

  /// Path to prefs.toml (default: platform config dir)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Directory for log files (default: platform data dir)
  #[arg(long, global = true)]
  log_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print the filtered catalog as JSON without starting the UI
  List(ListArgs),
  /// Generate shell completions
  Completions {
    #[arg(value_enum)]
    shell: clap_complete::Shell,
  },
}

#[derive(clap::Args, Debug, Default)]
struct ListArgs {
  /// Free-text query (case-insensitive)
  #[arg(short, long)]
  query: Option<String>,

  /// Month name or part of it, e.g. "giugno"
  #[arg(short, long)]
  month: Option<String>,

  /// Required tag, as group=value (repeatable)
  #[arg(short, long = "tag", value_parser = parse_tag)]
  tags: Vec<(String, String)>,

  /// Format tag value
  #[arg(short, long)]
  format: Option<String>,

  /// Category (tag value for videos, category label for materials)
  #[arg(short, long)]
  category: Option<String>,

  /// Topic chip (repeatable; any selected chip matches)
  #[arg(long = "chip")]
  chips: Vec<String>,

  #[arg(long, value_enum, default_value = "newest")]
  sort: SortMode,

  /// List the curated materials instead of the videos
  #[arg(long)]
  materials: bool,
}

fn parse_tag(s: &str) -> Result<(String, String)> {
  let (group, value) = s.split_once('=').ok_or_else(|| anyhow!("expected group=value, got {:?}", s))?;
  if group.trim().is_empty() || value.trim().is_empty() {
    return Err(anyhow!("expected group=value, got {:?}", s));
  }
  Ok((group.trim().to_string(), value.trim().to_string()))
}

impl ListArgs {
  /// Material categories are matched by exact label, so accept loose spellings on the command line.
  fn normalize_category(&self, category: &str) -> String {
    match Category::from_label(category) {
      Some(c) if self.materials => c.label().to_string(),
      _ => category.to_string(),
    }
  }

  fn criteria(&self, locale: &str) -> Criteria {
    let mut criteria = Criteria {
      free_text: self.query.clone().unwrap_or_default(),
      month_text: self.month.clone().unwrap_or_default(),
      format: self.format.clone(),
      category: self.category.as_deref().map(|c| self.normalize_category(c)),
      sort: self.sort,
      locale: locale.to_string(),
      ..Criteria::default()
    };
    for (group, value) in &self.tags {
      criteria.toggle_tag(group, value);
    }
    for chip in &self.chips {
      criteria.chips.insert(chip.clone());
    }
    criteria
  }
}

// --- Logging ---

/// Log to a daily rolling file; the terminal belongs to the UI.
fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
  std::fs::create_dir_all(log_dir).with_context(|| format!("Failed to create log dir {}", log_dir.display()))?;
  let file_appender = tracing_appender::rolling::daily(log_dir, "archivio.log");
  let (writer, guard) = tracing_appender::non_blocking(file_appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_writer(writer).with_ansi(false).with_target(false).with_env_filter(filter).init();
  Ok(guard)
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(Command::Completions { shell }) = &args.command {
    clap_complete::generate(*shell, &mut Args::command(), "archivio", &mut std::io::stdout());
    return Ok(());
  }

  let log_dir = args.log_dir.clone().unwrap_or_else(Config::log_dir);
  let _guard = init_logging(&log_dir)?;

  let config = Config::load(args.config.as_deref());
  let source = Source::parse(args.source.as_deref().unwrap_or(config.source()));
  info!(source = %source, "archivio: starting");

  if let Some(Command::List(list)) = &args.command {
    return run_list(list, &source, &config).await;
  }

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  execute!(std::io::stdout(), EnableMouseCapture).context("Failed to enable mouse capture")?;
  let result = run(&mut terminal, App::new(config, source), args.view).await;
  let _ = execute!(std::io::stdout(), DisableMouseCapture);
  ratatui::restore();
  result
}

async fn run_list(list: &ListArgs, source: &Source, config: &Config) -> Result<()> {
  let criteria = list.criteria(config.month_locale());
  let json = if list.materials {
    let materials = load_materials().context("Failed to load materials")?;
    serde_json::to_string_pretty(&filter::apply(&materials, &criteria))?
  } else {
    let videos = load_videos(source).await.with_context(|| format!("Failed to load videos from {}", source))?;
    serde_json::to_string_pretty(&filter::apply(&videos, &criteria))?
  };
  println!("{}", json);
  Ok(())
}

async fn run(terminal: &mut DefaultTerminal, mut app: App, view: View) -> Result<()> {
  app.activate(view).await;

  loop {
    app.check_pending();
    app.expire_error();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key).await?;
        }
        Event::Mouse(mouse) if mouse.kind == MouseEventKind::Moved => {
          app.pointer_moved(mouse.column, mouse.row);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.shutdown().await;
  info!("archivio: exiting");
  Ok(())
}
