//! Text boxes whose content types itself out word by word, then character by character.

use std::collections::HashMap;

use crate::{
    annotation::model::TextAnnotation,
    foundation::core::Viewport,
    foundation::error::{OverlayError, OverlayResult},
    layers::base::{Layer, LayerState},
    overlay::host::{Element, ElementId, LayerKind, SharedHost, TextBoxElement},
    timeline::progress::progress,
    transform::coords::rect_to_absolute,
};

/// Portion of `content` visible at `now` for the reveal window `[start, end]`.
///
/// With `p` the window progress and `n` the word count, the first `floor(p * n)` words are shown
/// in full (joined by single spaces), followed by `floor(frac * len)` characters of the next
/// word where `frac` is the progress into that word. Before `start` this is empty; from `end` on
/// it is `content` unchanged.
pub fn visible_text(content: &str, start: f64, end: f64, now: f64) -> String {
    if now < start {
        return String::new();
    }
    let p = progress(start, end, now);
    if p >= 1.0 {
        return content.to_string();
    }

    let words: Vec<&str> = content.split_whitespace().collect();
    let word_count = words.len();
    let scaled = p * word_count as f64;
    let full = (scaled.floor() as usize).min(word_count);

    let mut out = words[..full].join(" ");
    if let Some(next) = words.get(full) {
        let into_word = scaled - full as f64;
        let chars = (into_word * next.chars().count() as f64).floor() as usize;
        if chars > 0 {
            if !out.is_empty() {
                out.push(' ');
            }
            out.extend(next.chars().take(chars));
        }
    }
    out
}

/// Renders [`TextAnnotation`]s as retained text boxes on an overlay host.
pub struct TextLayer {
    host: SharedHost,
    state: LayerState<TextAnnotation>,
    primitives: HashMap<String, (ElementId, TextBoxElement)>,
}

impl std::fmt::Debug for TextLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextLayer")
            .field("state", &self.state)
            .field("primitives", &self.primitives)
            .finish_non_exhaustive()
    }
}

impl TextLayer {
    /// Create an empty layer drawing onto `host`.
    pub fn new(host: SharedHost, viewport: Viewport) -> Self {
        Self {
            host,
            state: LayerState::new(viewport),
            primitives: HashMap::new(),
        }
    }

    /// Number of text boxes currently on the host.
    pub fn box_count(&self) -> usize {
        self.primitives.len()
    }

    /// Text currently shown for annotation `id`.
    pub fn text_of(&self, id: &str) -> Option<&str> {
        self.primitives.get(id).map(|(_, el)| el.text.as_str())
    }
}

fn text_box(annotation: &TextAnnotation, viewport: &Viewport, now: f64) -> TextBoxElement {
    TextBoxElement {
        annotation_id: annotation.id.clone(),
        rect: rect_to_absolute(&annotation.rect, viewport),
        background: annotation.background,
        foreground: annotation.foreground,
        font_size_px: annotation.font_size * viewport.scale,
        text: visible_text(&annotation.content, annotation.start, annotation.end, now),
        visible: now >= annotation.start,
    }
}

impl Layer for TextLayer {
    type Annotation = TextAnnotation;

    fn kind(&self) -> LayerKind {
        LayerKind::Text
    }

    fn state(&self) -> &LayerState<TextAnnotation> {
        &self.state
    }

    fn state_mut(&mut self) -> &mut LayerState<TextAnnotation> {
        &mut self.state
    }

    fn rebuild(&mut self) -> OverlayResult<()> {
        self.release();
        let mut host = self.host.borrow_mut();
        if !host.is_attached() {
            return Err(OverlayError::validation("text layer host is not attached"));
        }
        let now = self.state.current_time;
        for annotation in &self.state.annotations {
            let element = text_box(annotation, &self.state.viewport, now);
            let id = host.create_element(LayerKind::Text, Element::TextBox(element.clone()))?;
            if let Some((stale, _)) = self
                .primitives
                .insert(annotation.id.clone(), (id, element))
            {
                tracing::warn!(id = %annotation.id, "duplicate text id; keeping the last one");
                host.remove_element(stale);
            }
        }
        Ok(())
    }

    fn apply_time(&mut self) -> OverlayResult<()> {
        let now = self.state.current_time;
        let mut host = self.host.borrow_mut();
        for annotation in &self.state.annotations {
            let Some((id, element)) = self.primitives.get_mut(&annotation.id) else {
                continue;
            };
            let text = visible_text(&annotation.content, annotation.start, annotation.end, now);
            let visible = now >= annotation.start;
            if element.text == text && element.visible == visible {
                continue;
            }
            element.text = text;
            element.visible = visible;
            host.update_element(*id, Element::TextBox(element.clone()))?;
        }
        Ok(())
    }

    fn release(&mut self) {
        let mut host = self.host.borrow_mut();
        for (_, (id, _)) in self.primitives.drain() {
            host.remove_element(id);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/layers/text.rs"]
mod tests;
