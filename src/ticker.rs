use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Horizontal scroll position of a bounded strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
  pub offset: u16,
  /// Full width of the strip content.
  pub content: u16,
  /// Visible width.
  pub viewport: u16,
  pub forward: bool,
}

impl Default for ScrollState {
  fn default() -> Self {
    Self { offset: 0, content: 0, viewport: 0, forward: true }
  }
}

impl ScrollState {
  pub fn max_offset(&self) -> u16 {
    self.content.saturating_sub(self.viewport)
  }

  /// Record the rendered geometry, clamping the offset into range.
  pub fn set_bounds(&mut self, content: u16, viewport: u16) {
    self.content = content;
    self.viewport = viewport;
    self.offset = self.offset.min(self.max_offset());
  }

  /// One tick: move by `step`, or turn around when within `tolerance` of the edge being approached.
  pub fn advance(&mut self, step: u16, tolerance: u16) {
    let max = self.max_offset();
    if self.forward {
      if self.offset.saturating_add(tolerance) >= max {
        self.forward = false;
      } else {
        self.offset = self.offset.saturating_add(step).min(max);
      }
    } else if self.offset <= tolerance {
      self.forward = true;
    } else {
      self.offset = self.offset.saturating_sub(step);
    }
  }
}

/// Periodic driver for a [`ScrollState`], owning at most one timer task.
pub struct AutoScroll {
  pub state: ScrollState,
  interval: Duration,
  step: u16,
  tolerance: u16,
  handle: Option<JoinHandle<()>>,
  tick_rx: Option<mpsc::Receiver<()>>,
}

impl AutoScroll {
  pub fn new(interval: Duration, step: u16, tolerance: u16) -> Self {
    Self { state: ScrollState::default(), interval, step, tolerance, handle: None, tick_rx: None }
  }

  pub fn is_running(&self) -> bool {
    self.handle.is_some()
  }

  /// Start ticking after `delay`. Does nothing if already running.
  pub fn start(&mut self, delay: Duration) {
    if self.is_running() {
      return;
    }
    let (tx, rx) = mpsc::channel(4);
    let period = self.interval;
    let handle = tokio::spawn(async move {
      tokio::time::sleep(delay).await;
      let mut interval = tokio::time::interval(period);
      // The first tick completes immediately.
      interval.tick().await;
      loop {
        interval.tick().await;
        if tx.is_closed() {
          break;
        }
        // Ticks the UI has not drained yet are dropped.
        let _ = tx.try_send(());
      }
    });
    debug!(delay_ms = delay.as_millis() as u64, "ticker: started");
    self.handle = Some(handle);
    self.tick_rx = Some(rx);
  }

  /// Cancel the timer. Safe to call when stopped.
  pub fn stop(&mut self) {
    if let Some(handle) = self.handle.take() {
      handle.abort();
      debug!("ticker: stopped");
    }
    self.tick_rx = None;
  }

  /// Apply pending ticks. Returns how many were applied.
  pub fn drain(&mut self) -> usize {
    let Some(rx) = self.tick_rx.as_mut() else { return 0 };
    let mut ticks = 0;
    while rx.try_recv().is_ok() {
      self.state.advance(self.step, self.tolerance);
      ticks += 1;
    }
    ticks
  }
}

impl Drop for AutoScroll {
  fn drop(&mut self) {
    self.stop();
  }
}
