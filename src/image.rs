use std::collections::HashSet;

const FALLBACK_GLYPH: char = '•';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(String),
    Placeholder(char),
}

impl ImageSource {
    /// Short text stand-in used by the terminal renderer.
    pub fn badge(&self) -> String {
        match self {
            ImageSource::Remote(_) => "◉".to_string(),
            ImageSource::Placeholder(glyph) => format!("[{glyph}]"),
        }
    }
}

pub fn placeholder_glyph(alt: &str) -> char {
    alt.trim()
        .chars()
        .next()
        .and_then(|ch| ch.to_uppercase().next())
        .unwrap_or(FALLBACK_GLYPH)
}

fn is_fetchable(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Picks the remote image when it is usable, otherwise a glyph taken from
/// the alt text.
pub fn resolve_image(url: Option<&str>, failed: bool, alt: &str) -> ImageSource {
    match url.map(str::trim) {
        Some(url) if !failed && is_fetchable(url) => ImageSource::Remote(url.to_string()),
        _ => ImageSource::Placeholder(placeholder_glyph(alt)),
    }
}

/// Remembers which logo URLs loaded and which failed.
#[derive(Debug, Clone, Default)]
pub struct ImageBook {
    failed: HashSet<String>,
    loaded: HashSet<String>,
}

impl ImageBook {
    pub fn record(&mut self, url: &str, ok: bool) {
        if ok {
            self.failed.remove(url);
            self.loaded.insert(url.to_string());
        } else {
            self.loaded.remove(url);
            self.failed.insert(url.to_string());
        }
    }

    pub fn has_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    pub fn needs_probe(&self, url: &str) -> bool {
        let url = url.trim();
        is_fetchable(url) && !self.failed.contains(url) && !self.loaded.contains(url)
    }

    pub fn resolve(&self, url: &str, alt: &str) -> ImageSource {
        let trimmed = url.trim();
        resolve_image(Some(trimmed), self.has_failed(trimmed), alt)
    }
}
