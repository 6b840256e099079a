//! Retained overlay elements (highlight quads, text boxes) and the host that displays them.

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc};

use serde::Serialize;

use crate::{
    foundation::color::Color,
    foundation::core::PixelRect,
    foundation::error::{OverlayError, OverlayResult},
};

/// Handle to an element created on an [`OverlayHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Which overlay layer owns an element. Hosts stack them in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// Highlight quads, bottom-most.
    Highlight,
    /// Typed text boxes.
    Text,
    /// Freehand ink, top-most.
    Drawing,
}

impl LayerKind {
    /// Lowercase name used in logs and snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Highlight => "highlight",
            Self::Text => "text",
            Self::Drawing => "drawing",
        }
    }
}

/// One highlight rectangle, revealed left to right by `scale_x`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuadElement {
    /// Owning annotation.
    pub annotation_id: String,
    /// Index of the quad within its annotation.
    pub quad_index: usize,
    /// Full (unrevealed) rectangle in viewport pixels.
    pub rect: PixelRect,
    /// Fill color.
    pub color: Color,
    /// Horizontal reveal in `[0, 1]`, anchored at the left edge.
    pub scale_x: f64,
    /// Whether the element should be shown at all.
    pub visible: bool,
}

impl QuadElement {
    /// The rectangle as currently revealed.
    pub fn revealed_rect(&self) -> PixelRect {
        self.rect.scaled_from_left(self.scale_x)
    }
}

/// A text box whose content is revealed progressively.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextBoxElement {
    /// Owning annotation.
    pub annotation_id: String,
    /// Box position and size in viewport pixels.
    pub rect: PixelRect,
    /// Box fill.
    pub background: Color,
    /// Text color.
    pub foreground: Color,
    /// Font size in pixels (already multiplied by the viewport scale).
    pub font_size_px: f64,
    /// Currently visible text.
    pub text: String,
    /// Whether the element should be shown at all.
    pub visible: bool,
}

/// A retained overlay primitive.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Highlight rectangle.
    HighlightQuad(QuadElement),
    /// Text box.
    TextBox(TextBoxElement),
}

impl Element {
    /// Annotation that produced this element.
    pub fn annotation_id(&self) -> &str {
        match self {
            Self::HighlightQuad(q) => &q.annotation_id,
            Self::TextBox(t) => &t.annotation_id,
        }
    }

    /// Whether the element is currently shown.
    pub fn is_visible(&self) -> bool {
        match self {
            Self::HighlightQuad(q) => q.visible,
            Self::TextBox(t) => t.visible,
        }
    }
}

/// Display surface for retained overlay elements.
///
/// Elements are positioned in the same pixel space as the rendered page; hosts are expected to
/// stack them above it in [`LayerKind`] order.
pub trait OverlayHost {
    /// Whether the host is still attached to something that displays it.
    fn is_attached(&self) -> bool {
        true
    }

    /// Add an element to `layer` and return its handle.
    fn create_element(&mut self, layer: LayerKind, element: Element) -> OverlayResult<ElementId>;

    /// Replace the properties of an existing element.
    fn update_element(&mut self, id: ElementId, element: Element) -> OverlayResult<()>;

    /// Remove an element. Unknown ids are ignored.
    fn remove_element(&mut self, id: ElementId);
}

/// Shared handle to an overlay host.
pub type SharedHost = Rc<RefCell<dyn OverlayHost>>;

/// In-memory [`OverlayHost`] that keeps a scene graph for inspection and snapshots.
#[derive(Debug)]
pub struct SceneHost {
    elements: BTreeMap<ElementId, (LayerKind, Element)>,
    next_id: u64,
    updates: usize,
    attached: bool,
}

impl Default for SceneHost {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneHost {
    /// Create an empty, attached host.
    pub fn new() -> Self {
        Self {
            elements: BTreeMap::new(),
            next_id: 1,
            updates: 0,
            attached: true,
        }
    }

    /// Wrap in a shared handle.
    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Simulate the host being detached from (or re-attached to) its display.
    pub fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// Number of live elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether no elements are live.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total successful [`OverlayHost::update_element`] calls so far.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    /// Look up an element.
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id).map(|(_, el)| el)
    }

    /// Live elements on `layer`, in creation order.
    pub fn elements(&self, layer: LayerKind) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .filter(move |(_, (l, _))| *l == layer)
            .map(|(id, (_, el))| (*id, el))
    }

    /// Highlight quads, in creation order.
    pub fn quads(&self) -> impl Iterator<Item = &QuadElement> {
        self.elements(LayerKind::Highlight)
            .filter_map(|(_, el)| match el {
                Element::HighlightQuad(q) => Some(q),
                Element::TextBox(_) => None,
            })
    }

    /// Text boxes, in creation order.
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBoxElement> {
        self.elements(LayerKind::Text).filter_map(|(_, el)| match el {
            Element::TextBox(t) => Some(t),
            Element::HighlightQuad(_) => None,
        })
    }

    /// Serializable view of the current scene.
    pub fn snapshot(&self) -> SceneSnapshot {
        SceneSnapshot {
            elements: self
                .elements
                .iter()
                .map(|(id, (layer, el))| SnapshotEntry {
                    id: *id,
                    layer: *layer,
                    element: el.clone(),
                })
                .collect(),
        }
    }
}

impl OverlayHost for SceneHost {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn create_element(&mut self, layer: LayerKind, element: Element) -> OverlayResult<ElementId> {
        if !self.attached {
            return Err(OverlayError::validation("overlay host is detached"));
        }
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, (layer, element));
        Ok(id)
    }

    fn update_element(&mut self, id: ElementId, element: Element) -> OverlayResult<()> {
        let Some((_, slot)) = self.elements.get_mut(&id) else {
            return Err(OverlayError::Other(anyhow::anyhow!(
                "update of unknown overlay element {id}"
            )));
        };
        *slot = element;
        self.updates += 1;
        Ok(())
    }

    fn remove_element(&mut self, id: ElementId) {
        self.elements.remove(&id);
    }
}

/// Serializable dump of a [`SceneHost`].
#[derive(Clone, Debug, Serialize)]
pub struct SceneSnapshot {
    /// Live elements in creation order.
    pub elements: Vec<SnapshotEntry>,
}

/// One element in a [`SceneSnapshot`].
#[derive(Clone, Debug, Serialize)]
pub struct SnapshotEntry {
    /// Element handle.
    pub id: ElementId,
    /// Owning layer.
    pub layer: LayerKind,
    /// Element properties.
    #[serde(flatten)]
    pub element: Element,
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/host.rs"]
mod tests;
