//! The curated materials shipped with the application.

use crate::constants::constants;
use crate::record::{Category, Material, MaterialKind, Record, TagMap};
use crate::youtube::{ensure_autoplay, extract_thumbnail};

fn material(id: u64, title: &str, url: &str, kind: MaterialKind, author: &str, date: &str) -> Material {
  Material {
    record: Record {
      id,
      title: title.to_string(),
      date: date.to_string(),
      url: Some(url.to_string()),
      tags: TagMap::new(),
      poster: None,
    },
    kind,
    category: None,
    author: Some(author.to_string()),
    description: None,
    embed: None,
    featured: false,
  }
}

/// A PDF material with the placeholder poster.
fn document(id: u64, title: &str, url: &str, author: &str, date: &str) -> Material {
  let mut m = material(id, title, url, MaterialKind::Pdf, author, date);
  m.record.poster = Some(constants().pdf_placeholder_poster.clone());
  m
}

/// A video material: embed URL with autoplay, poster derived from the URL when possible.
pub fn video(id: u64, title: &str, url: &str, author: &str, date: &str) -> Material {
  let mut m = material(id, title, url, MaterialKind::Video, author, date);
  m.embed = Some(ensure_autoplay(url));
  m.record.poster = Some(extract_thumbnail(Some(url)).unwrap_or_else(|| constants().video_placeholder_poster.clone()));
  m
}

trait MaterialExt {
  fn category(self, category: Category) -> Self;
  fn tags(self, tags: &[&str]) -> Self;
  fn description(self, description: &str) -> Self;
  fn featured(self) -> Self;
}

impl MaterialExt for Material {
  fn category(mut self, category: Category) -> Self {
    self.category = Some(category);
    self
  }

  fn tags(mut self, tags: &[&str]) -> Self {
    self.record.tags = TagMap::with_group(&constants().material_tag_group, tags.iter().copied());
    self
  }

  fn description(mut self, description: &str) -> Self {
    self.description = Some(description.to_string()).filter(|d| !d.is_empty());
    self
  }

  fn featured(mut self) -> Self {
    self.featured = true;
    self
  }
}

/// The built-in materials, as authored (before load-time normalization).
pub fn builtin() -> Vec<Material> {
  vec![
    document(1, "Marx - Critica all'ideologia", "assets/Marx_Critica all'ideologia.pdf", "Karl Marx", "2025-10-22")
      .category(Category::Teoria)
      .featured(),
    video(2, "JD Vance, \"ordo amoris\"", "https://www.youtube.com/embed/o98Po0lWZxE?rel=0", "Fox News", "2025-1-30")
      .description("Esempio esplicativo dell'ideologia elettorato Trump")
      .category(Category::Attualita)
      .tags(&["USA"])
      .featured(),
    document(3, "Trasimaco - Sulla Giustizia", "assets/Trasimaco giustizia.pdf", "Trasimaco", "2024-10-20")
      .description("Analisi filosofica del concetto di giustizia nel pensiero di Trasimaco")
      .category(Category::Teoria)
      .tags(&["filosofia", "giustizia", "platone", "sofisti"])
      .featured(),
    video(4, "Leone sul piano di pace di Trump", "https://www.youtube.com/embed/ng6Chg_uwqs?rel=0", "Vatican News", "2025-9-30")
      .category(Category::Attualita)
      .tags(&["Vaticano", "Gaza", "Guerra in Ucraina"])
      .featured(),
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  #[test]
  fn builtin_ids_are_unique() {
    let list = builtin();
    let ids: HashSet<u64> = list.iter().map(|m| m.record.id).collect();
    assert_eq!(ids.len(), list.len());
  }

  #[test]
  fn builtin_videos_have_embed_and_thumbnail() {
    for m in builtin().into_iter().filter(|m| m.kind == MaterialKind::Video) {
      let embed = m.embed.as_deref().unwrap();
      assert!(embed.contains("autoplay=1"), "{}", embed);
      assert!(m.record.poster.as_deref().unwrap().starts_with("https://img.youtube.com/vi/"));
    }
  }

  #[test]
  fn video_helper_falls_back_to_placeholder_poster() {
    let m = video(9, "t", "https://example.org/clip.mp4", "a", "2024-01-01");
    assert_eq!(m.record.poster.as_deref(), Some(constants().video_placeholder_poster.as_str()));
    assert_eq!(m.embed.as_deref(), Some("https://example.org/clip.mp4?autoplay=1"));
  }
}
