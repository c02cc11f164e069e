use tracing::debug;

use crate::filter::Entry;

/// Which entry, if any, is playing. A single optional id, so at most one entry plays at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackSelector {
  playing: Option<u64>,
}

impl PlaybackSelector {
  pub fn playing(&self) -> Option<u64> {
    self.playing
  }

  pub fn is_playing(&self, id: u64) -> bool {
    self.playing == Some(id)
  }

  /// Select `entry` for playback, replacing any current selection.
  /// Entries that cannot be played leave the state untouched. Returns whether the selection changed.
  pub fn play<T: Entry>(&mut self, entry: &T) -> bool {
    if !entry.playable() {
      debug!(id = entry.id(), "playback: entry not playable");
      return false;
    }
    let previous = self.playing.replace(entry.id());
    previous != self.playing
  }

  /// Back to idle. A no-op when nothing plays.
  pub fn stop(&mut self) {
    self.playing = None;
  }
}
