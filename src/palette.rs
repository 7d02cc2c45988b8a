use crate::error::ReportWarning;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Palette used until a `colors` directive replaces it.
pub fn default_palette() -> Vec<Rgb> {
    vec![Rgb(215, 63, 9), Rgb(170, 157, 46), Rgb(74, 119, 60)]
}

/// Ordered colours handed out cyclically to series or points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPalette {
    colors: Vec<Rgb>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: default_palette(),
        }
    }
}

impl ColorPalette {
    /// Returns `None` for an empty colour list.
    pub fn new(colors: Vec<Rgb>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn color_at(&self, index: usize) -> Rgb {
        self.colors[index % self.colors.len()]
    }

    /// Colours for `count` items in order, cycling when the palette is short.
    pub fn assign(&self, count: usize) -> (Vec<Rgb>, Option<ReportWarning>) {
        let colors = (0..count).map(|i| self.color_at(i)).collect();
        let warning = (count > self.colors.len()).then(|| ReportWarning::PaletteInsufficient {
            needed: count,
            available: self.colors.len(),
        });
        (colors, warning)
    }
}
