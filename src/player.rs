use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::{AsyncBufReadExt, BufReader as TokioBufReader},
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{debug, info};

/// What is being played right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
  pub id: u64,
  pub title: String,
  pub url: String,
}

/// Owns at most one `mpv` process and the task reading its status line.
pub struct Player {
  current_process: Option<TokioChild>,
  pub now_playing: Option<NowPlaying>,
  monitor_handle: Option<JoinHandle<()>>,
  status_rx: Option<mpsc::Receiver<String>>,
  last_status: Option<String>,
}

impl Default for Player {
  fn default() -> Self {
    Self::new()
  }
}

impl Player {
  pub fn new() -> Self {
    Self { current_process: None, now_playing: None, monitor_handle: None, status_rx: None, last_status: None }
  }

  pub fn is_playing(&self) -> bool {
    self.current_process.is_some()
  }

  /// Drain status lines from mpv, keeping the latest.
  pub fn check_status(&mut self) {
    if let Some(rx) = &mut self.status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_status = Some(status);
      }
    }
  }

  pub fn last_status(&self) -> Option<&str> {
    self.last_status.as_deref()
  }

  /// Start playing `item`, stopping whatever was playing before.
  pub async fn play(&mut self, item: NowPlaying) -> Result<()> {
    self.stop().await.context("Failed to stop previous playback")?;
    if item.url.is_empty() {
      return Err(anyhow!("No playable URL for \"{}\"", item.title));
    }

    let mut cmd = Command::new("mpv");
    cmd.args([
      "--term-status-msg=Time: ${time-pos/full} / ${duration/full} | ${pause} ${percent-pos}%",
      "--force-window=immediate",
      &item.url,
    ]);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Send stderr to null: if piped but never drained, the pipe buffer
    // fills and mpv blocks.
    cmd.stderr(Stdio::null());

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    self.status_rx = Some(rx);

    let monitor_handle = tokio::spawn(async move {
      let reader = TokioBufReader::new(stdout);
      let mut lines = reader.lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    info!(id = item.id, url = %item.url, "player: started mpv");
    self.current_process = Some(child);
    self.monitor_handle = Some(monitor_handle);
    self.now_playing = Some(item);
    Ok(())
  }

  /// Kill the mpv process, if any. Safe to call when idle.
  pub async fn stop(&mut self) -> Result<()> {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
      let _ = handle.await;
    }
    self.status_rx = None;
    self.last_status = None;

    if let Some(mut child) = self.current_process.take() {
      child.kill().await.context("Failed to kill mpv process")?;
      let _ = child.wait().await;
      debug!("player: stopped mpv");
    }

    self.now_playing = None;
    Ok(())
  }

  /// Forget a process that exited by itself (window closed, end of video).
  /// Returns whether it had exited.
  pub fn reap_finished(&mut self) -> bool {
    let exited = self.current_process.as_mut().is_some_and(|child| matches!(child.try_wait(), Ok(Some(_))));
    if exited {
      if let Some(handle) = self.monitor_handle.take() {
        handle.abort();
      }
      self.current_process = None;
      self.status_rx = None;
      self.last_status = None;
      self.now_playing = None;
      debug!("player: mpv exited");
    }
    exited
  }
}

/// Hand a document or link to the platform opener.
pub fn open_external(target: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(target)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {} {}", cmd, target))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  info!(target = %target, "player: opened externally");
  Ok(())
}
