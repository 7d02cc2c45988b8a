// Plain-text template document with `{{{ ... }}}` directive markers

use crate::runtime::{DirectiveSource, DocumentSink};
use anyhow::{anyhow, Context, Result};
use nom::{
    bytes::complete::{tag, take_until},
    combinator::recognize,
    sequence::tuple,
    IResult,
};
use std::ops::Range;
use std::path::Path;

pub const OPEN_MARKER: &str = "{{{";
pub const CLOSE_MARKER: &str = "}}}";

/// Template text scanned front to back for directive markers.
///
/// Each replacement rewrites the marker most recently handed out; scanning
/// resumes after the replacement, so substituted text is never rescanned and a
/// marker left in place is never returned twice.
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    text: String,
    cursor: usize,
    current: Option<Range<usize>>,
}

impl TemplateDocument {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: 0,
            current: None,
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read template '{}'", path.display()))?;
        Ok(Self::new(text))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    fn replace_current(&mut self, replacement: &str) -> Result<()> {
        let span = self
            .current
            .take()
            .ok_or_else(|| anyhow!("no directive is pending replacement"))?;
        self.text.replace_range(span.clone(), replacement);
        self.cursor = span.start + replacement.len();
        Ok(())
    }
}

/// Text before the next marker, and the marker itself including its braces
fn next_marker(input: &str) -> IResult<&str, (&str, &str)> {
    let (rest, before) = take_until(OPEN_MARKER)(input)?;
    let (rest, marker) = recognize(tuple((
        tag(OPEN_MARKER),
        take_until(CLOSE_MARKER),
        tag(CLOSE_MARKER),
    )))(rest)?;
    Ok((rest, (before, marker)))
}

impl DirectiveSource for TemplateDocument {
    fn next_directive(&mut self) -> Result<Option<String>> {
        let remaining = &self.text[self.cursor..];
        let Ok((_, (before, marker))) = next_marker(remaining) else {
            self.current = None;
            return Ok(None);
        };

        let start = self.cursor + before.len();
        let end = start + marker.len();
        let directive = marker.to_string();
        self.current = Some(start..end);
        self.cursor = end;
        Ok(Some(directive))
    }
}

impl DocumentSink for TemplateDocument {
    fn replace_text(&mut self, text: &str) -> Result<()> {
        self.replace_current(text)
    }

    /// Inserted as a Markdown image reference
    fn replace_with_image(&mut self, image: &Path, title: &str) -> Result<()> {
        let reference = format!("![{}]({})", title, image.display());
        self.replace_current(&reference)
    }
}
