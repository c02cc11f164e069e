//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! with no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // Media URLs
  pub thumbnail_url_template: String,
  pub embed_url_base: String,
  pub embed_params: String,
  pub autoplay_param: String,
  pub placeholder_marker: String,
  pub pdf_placeholder_poster: String,
  pub video_placeholder_poster: String,

  // Record source
  pub default_source: String,
  pub legacy_tag_group: String,
  pub material_tag_group: String,

  // Filter groups
  pub chip_group: String,
  pub format_group: String,
  pub category_group: String,
  pub default_month_locale: String,

  // Materials
  pub featured_limit: usize,

  // Featured strip auto-scroll
  pub scroll_start_delay_ms: u64,
  pub scroll_interval_ms: u64,
  pub scroll_step: u16,
  pub scroll_edge_tolerance: u16,
  pub featured_card_width: u16,

  // Site
  pub site_title: String,
  pub site_author: String,
  pub site_description: String,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.thumbnail_url_template.contains("{id}"));
    assert_eq!(c.chip_group, "argomento");
    assert!(c.scroll_interval_ms > 0);
    assert!(c.featured_limit > 0);
  }
}
