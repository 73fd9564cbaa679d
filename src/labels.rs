//! Mapping from classifier output indices to display glyphs.

use crate::{constants::UNKNOWN_GLYPH, Error, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Ordered index-to-glyph table loaded once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    glyphs: BTreeMap<usize, String>,
}

impl Default for LabelMap {
    /// Kannada vowels the bundled model was trained on
    fn default() -> Self {
        Self::from_pairs([(0, "ಅ"), (1, "ಆ"), (2, "ಇ"), (3, "ಈ")])
    }
}

impl LabelMap {
    /// Build a map from `(index, glyph)` pairs
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (usize, S)>,
        S: Into<String>,
    {
        Self {
            glyphs: pairs.into_iter().map(|(i, g)| (i, g.into())).collect(),
        }
    }

    /// Load a labels file with one `<index> <glyph>` pair per line.
    ///
    /// Blank lines and lines starting with `#` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a line is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let map = Self::parse(&content)?;
        log::info!(
            "Loaded {} labels from {}",
            map.len(),
            path.as_ref().display()
        );
        Ok(map)
    }

    /// Parse label file content
    ///
    /// # Errors
    ///
    /// Returns an error if a line lacks an index or glyph, the index is not a
    /// number, or an index appears twice
    pub fn parse(content: &str) -> Result<Self> {
        let mut glyphs = BTreeMap::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (index, glyph) = line.split_once(char::is_whitespace).ok_or_else(|| {
                Error::LabelMap(format!("line {}: expected '<index> <glyph>'", line_no + 1))
            })?;
            let index: usize = index.parse().map_err(|_| {
                Error::LabelMap(format!("line {}: invalid index '{index}'", line_no + 1))
            })?;
            let glyph = glyph.trim();
            if glyphs.insert(index, glyph.to_string()).is_some() {
                return Err(Error::LabelMap(format!(
                    "line {}: duplicate index {index}",
                    line_no + 1
                )));
            }
        }
        if glyphs.is_empty() {
            return Err(Error::LabelMap("no labels defined".to_string()));
        }
        Ok(Self { glyphs })
    }

    /// Glyph for `index`, or the unknown sentinel when unmapped
    #[must_use]
    pub fn resolve(&self, index: usize) -> &str {
        self.glyphs.get(&index).map_or(UNKNOWN_GLYPH, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}
