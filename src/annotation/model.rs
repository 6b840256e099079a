use std::{collections::HashSet, path::Path};

use anyhow::Context;

use crate::{
    foundation::color::Color,
    foundation::core::NormRect,
    foundation::error::{OverlayError, OverlayResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
/// A time-windowed annotation attached to one page.
///
/// Unrecognized `kind` values deserialize into [`Annotation::Unknown`] so newer annotation sets
/// still load; the orchestrator drops them at routing time.
pub enum Annotation {
    /// Highlighted region(s) that sweep in left to right.
    Highlight(HighlightAnnotation),
    /// Text box whose content types itself in.
    Text(TextAnnotation),
    /// Hand-drawn strokes that draw themselves point by point.
    Ink(InkAnnotation),
    /// Annotation kind this version does not understand.
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Highlight made of one or more quads, e.g. one per visual line.
pub struct HighlightAnnotation {
    /// Unique annotation id.
    pub id: String,
    /// 1-indexed page number.
    pub page: u32,
    /// Reveal start in seconds.
    pub start: f64,
    /// Reveal end in seconds (`end >= start`).
    pub end: f64,
    /// Ordered normalized rectangles.
    pub quads: Vec<NormRect>,
    /// Fill color.
    #[serde(default = "default_highlight_color")]
    pub color: Color,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Text box with a word-then-character typing reveal.
pub struct TextAnnotation {
    /// Unique annotation id.
    pub id: String,
    /// 1-indexed page number.
    pub page: u32,
    /// Reveal start in seconds.
    pub start: f64,
    /// Reveal end in seconds (`end >= start`).
    pub end: f64,
    /// Full text content.
    pub content: String,
    /// Normalized box placement.
    pub rect: NormRect,
    /// Box background.
    #[serde(default = "default_text_background")]
    pub background: Color,
    /// Text color.
    #[serde(default = "default_text_foreground")]
    pub foreground: Color,
    /// Font size in points at scale 1.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Freehand ink; all strokes share the annotation's time window.
pub struct InkAnnotation {
    /// Unique annotation id.
    pub id: String,
    /// 1-indexed page number.
    pub page: u32,
    /// Reveal start in seconds.
    pub start: f64,
    /// Reveal end in seconds (`end >= start`).
    pub end: f64,
    /// Ordered pen strokes.
    pub strokes: Vec<InkStroke>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One continuous pen path.
pub struct InkStroke {
    /// Stroke color.
    #[serde(default = "default_ink_color")]
    pub color: Color,
    /// Line width in logical pixels at scale 1.
    #[serde(default = "default_ink_width")]
    pub width: f64,
    /// Ordered timed points.
    pub points: Vec<InkPoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Timed pen sample.
pub struct InkPoint {
    /// Normalized offset in `[0, 1]` within the annotation's duration.
    pub t: f64,
    /// Normalized horizontal position.
    pub x: f64,
    /// Normalized vertical position.
    pub y: f64,
}

fn default_highlight_color() -> Color {
    Color::rgba(1.0, 0.92, 0.23, 0.4)
}

fn default_text_background() -> Color {
    Color::rgba(1.0, 1.0, 1.0, 0.9)
}

fn default_text_foreground() -> Color {
    Color::BLACK
}

fn default_font_size() -> f64 {
    14.0
}

fn default_ink_color() -> Color {
    Color::rgba(0.86, 0.15, 0.15, 1.0)
}

fn default_ink_width() -> f64 {
    2.0
}

impl Annotation {
    /// Annotation id, `None` for unknown kinds.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Highlight(a) => Some(&a.id),
            Self::Text(a) => Some(&a.id),
            Self::Ink(a) => Some(&a.id),
            Self::Unknown => None,
        }
    }

    /// Page number, `None` for unknown kinds.
    pub fn page(&self) -> Option<u32> {
        match self {
            Self::Highlight(a) => Some(a.page),
            Self::Text(a) => Some(a.page),
            Self::Ink(a) => Some(a.page),
            Self::Unknown => None,
        }
    }

    /// `(start, end)` window in seconds, `None` for unknown kinds.
    pub fn window(&self) -> Option<(f64, f64)> {
        match self {
            Self::Highlight(a) => Some((a.start, a.end)),
            Self::Text(a) => Some((a.start, a.end)),
            Self::Ink(a) => Some((a.start, a.end)),
            Self::Unknown => None,
        }
    }

    /// Short kind label used in logs and summaries.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Highlight(_) => "highlight",
            Self::Text(_) => "text",
            Self::Ink(_) => "ink",
            Self::Unknown => "unknown",
        }
    }

    /// Validate the common fields and the kind-specific payload.
    ///
    /// Unknown kinds always pass: they carry nothing this version can check.
    pub fn validate(&self) -> OverlayResult<()> {
        let (Some(id), Some(page), Some((start, end))) = (self.id(), self.page(), self.window())
        else {
            return Ok(());
        };
        if id.trim().is_empty() {
            return Err(OverlayError::validation("annotation id must be non-empty"));
        }
        if page == 0 {
            return Err(OverlayError::validation(format!(
                "annotation '{id}': page is 1-indexed"
            )));
        }
        if !start.is_finite() || !end.is_finite() {
            return Err(OverlayError::validation(format!(
                "annotation '{id}': start/end must be finite"
            )));
        }
        if end < start {
            return Err(OverlayError::validation(format!(
                "annotation '{id}': end ({end}) must be >= start ({start})"
            )));
        }

        match self {
            Self::Highlight(a) => {
                for (i, q) in a.quads.iter().enumerate() {
                    q.validate(&format!("annotation '{id}' quad {i}"))?;
                }
            }
            Self::Text(a) => {
                a.rect.validate(&format!("annotation '{id}' rect"))?;
                if !a.font_size.is_finite() || a.font_size <= 0.0 {
                    return Err(OverlayError::validation(format!(
                        "annotation '{id}': font_size must be > 0"
                    )));
                }
            }
            Self::Ink(a) => {
                for (si, stroke) in a.strokes.iter().enumerate() {
                    if !stroke.width.is_finite() || stroke.width < 0.0 {
                        return Err(OverlayError::validation(format!(
                            "annotation '{id}' stroke {si}: width must be >= 0"
                        )));
                    }
                    let bad = stroke
                        .points
                        .iter()
                        .any(|p| !(p.t.is_finite() && p.x.is_finite() && p.y.is_finite()));
                    if bad {
                        return Err(OverlayError::validation(format!(
                            "annotation '{id}' stroke {si}: points must be finite"
                        )));
                    }
                }
            }
            Self::Unknown => {}
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
/// Ordered collection of annotations for one document.
///
/// Accepts either a bare JSON array or an object with an `annotations` array.
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
}

impl<'de> serde::Deserialize<'de> for AnnotationSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Repr {
            List(Vec<Annotation>),
            Wrapped { annotations: Vec<Annotation> },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::List(annotations) | Repr::Wrapped { annotations } => Self { annotations },
        })
    }
}

impl AnnotationSet {
    /// Wrap an already-built list.
    pub fn new(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    /// Parse a set from JSON text.
    pub fn from_json_str(json: &str) -> OverlayResult<Self> {
        serde_json::from_str(json).map_err(|e| OverlayError::serde(e.to_string()))
    }

    /// Read and parse a JSON annotation file.
    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read annotation set '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Validate every annotation and reject duplicate ids.
    pub fn validate(&self) -> OverlayResult<()> {
        let mut seen = HashSet::new();
        for a in &self.annotations {
            a.validate()?;
            if let Some(id) = a.id()
                && !seen.insert(id)
            {
                return Err(OverlayError::validation(format!(
                    "duplicate annotation id '{id}'"
                )));
            }
        }
        Ok(())
    }

    /// All annotations in authoring order.
    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Annotations attached to `page`.
    pub fn for_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.page() == Some(page))
    }

    /// Highest page number referenced, `0` for an empty set.
    pub fn max_page(&self) -> u32 {
        self.annotations
            .iter()
            .filter_map(Annotation::page)
            .max()
            .unwrap_or(0)
    }

    /// Number of annotations, unknown kinds included.
    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

impl From<Vec<Annotation>> for AnnotationSet {
    fn from(annotations: Vec<Annotation>) -> Self {
        Self::new(annotations)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/annotation/model.rs"]
mod tests;
