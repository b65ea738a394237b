//! Canvas elements and sparse element updates.
//!
//! An element is a flat bag of optional visual attributes keyed by a caller
//! supplied id. The `kind` only hints at which attributes are meaningful;
//! nothing stops a rectangle from carrying `text`.

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Identifier of a canvas element.
pub type ElementId = String;

/// Side length of the default shape elements created from the toolbar.
pub const DEFAULT_SHAPE_SIZE: f64 = 100.0;
/// Height of the default text element created from the toolbar.
pub const DEFAULT_TEXT_HEIGHT: f64 = 50.0;
/// Font size of the default text element.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;
/// Font family of the default text element.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Fill of the default text element.
pub const DEFAULT_TEXT_FILL: &str = "#000000";
/// Fill of the default shape elements.
pub const DEFAULT_SHAPE_FILL: &str = "#3b82f6";
/// Stroke of the default shape elements.
pub const DEFAULT_SHAPE_STROKE: &str = "#1e40af";
/// Stroke width of the default shape elements.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

/// Generate a fresh element id.
pub fn new_element_id() -> ElementId {
    Uuid::new_v4().to_string()
}

/// Keep the first element for each id. Returns how many were dropped.
pub(crate) fn dedupe_by_id(elements: &mut Vec<CanvasElement>) -> usize {
    let mut seen = HashSet::new();
    let before = elements.len();
    elements.retain(|element| seen.insert(element.id.clone()));
    before - elements.len()
}

/// Kind of drawable element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Rect,
    Circle,
    Line,
    Image,
}

impl ElementKind {
    /// Name used in the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Text => "text",
            ElementKind::Rect => "rect",
            ElementKind::Circle => "circle",
            ElementKind::Line => "line",
            ElementKind::Image => "image",
        }
    }
}

/// Font weight for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font style for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// Horizontal alignment for text elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// A drawable unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    /// Unique, caller supplied identifier.
    pub id: ElementId,
    /// Element kind.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Left edge in canvas coordinates.
    pub left: f64,
    /// Top edge in canvas coordinates.
    pub top: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    /// Rotation in degrees.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    /// Image source URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    // Line endpoints, relative to `left`/`top`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

impl CanvasElement {
    /// Create a bare element with only position set.
    pub fn new(id: impl Into<ElementId>, kind: ElementKind, left: f64, top: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            left,
            top,
            width: None,
            height: None,
            fill: None,
            stroke: None,
            stroke_width: None,
            opacity: None,
            rotation: None,
            scale_x: None,
            scale_y: None,
            text: None,
            font_size: None,
            font_family: None,
            font_weight: None,
            font_style: None,
            text_align: None,
            src: None,
            x1: None,
            y1: None,
            x2: None,
            y2: None,
        }
    }

    /// Create a text element with the editor's default styling.
    pub fn text(id: impl Into<ElementId>, left: f64, top: f64, text: impl Into<String>) -> Self {
        let mut element = Self::new(id, ElementKind::Text, left, top)
            .with_size(DEFAULT_SHAPE_SIZE, DEFAULT_TEXT_HEIGHT);
        element.fill = Some(DEFAULT_TEXT_FILL.to_string());
        element.text = Some(text.into());
        element.font_size = Some(DEFAULT_FONT_SIZE);
        element.font_family = Some(DEFAULT_FONT_FAMILY.to_string());
        element
    }

    /// Create a shape element with the editor's default styling.
    pub fn shape(id: impl Into<ElementId>, kind: ElementKind, left: f64, top: f64) -> Self {
        let mut element =
            Self::new(id, kind, left, top).with_size(DEFAULT_SHAPE_SIZE, DEFAULT_SHAPE_SIZE);
        element.fill = Some(DEFAULT_SHAPE_FILL.to_string());
        element.stroke = Some(DEFAULT_SHAPE_STROKE.to_string());
        element.stroke_width = Some(DEFAULT_STROKE_WIDTH);
        element
    }

    /// Set the extents.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Copy this element under a new id, shifted by `offset`.
    pub fn duplicate(&self, id: impl Into<ElementId>, offset: Vec2) -> Self {
        let mut copy = self.clone();
        copy.id = id.into();
        copy.left += offset.x;
        copy.top += offset.y;
        copy
    }

    /// Axis-aligned bounds in canvas coordinates.
    ///
    /// Uses `width`/`height` when both are set, otherwise the line endpoints.
    /// Rotation is ignored. Returns `None` when the element has no extent.
    pub fn bounds(&self) -> Option<Rect> {
        let scale = Vec2::new(self.scale_x.unwrap_or(1.0), self.scale_y.unwrap_or(1.0));
        let origin = Point::new(self.left, self.top);

        if let (Some(width), Some(height)) = (self.width, self.height) {
            let far = origin + Vec2::new(width * scale.x, height * scale.y);
            return Some(Rect::from_points(origin, far));
        }

        match (self.x1, self.y1, self.x2, self.y2) {
            (Some(x1), Some(y1), Some(x2), Some(y2)) => {
                let start = origin + Vec2::new(x1 * scale.x, y1 * scale.y);
                let end = origin + Vec2::new(x2 * scale.x, y2 * scale.y);
                Some(Rect::from_points(start, end))
            }
            _ => None,
        }
    }

    /// Check whether `point` falls inside the bounds grown by `tolerance`.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds()
            .map(|bounds| bounds.inflate(tolerance, tolerance).contains(point))
            .unwrap_or(false)
    }
}

/// Copy every `Some` field of a patch onto an element.
macro_rules! merge_optional {
    ($patch:ident => $element:ident: $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = &$patch.$field {
                $element.$field = Some(value.clone());
            }
        )+
    };
}

/// A sparse set of field changes for [`CanvasElement`].
///
/// `None` leaves the field untouched. The id cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementPatch {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ElementKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y2: Option<f64>,
}

impl ElementPatch {
    /// Patch that moves an element.
    pub fn position(left: f64, top: f64) -> Self {
        Self {
            left: Some(left),
            top: Some(top),
            ..Self::default()
        }
    }

    /// Patch that resizes an element.
    pub fn size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }

    /// True if applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into `element`, leaving the rest untouched.
    pub fn apply_to(&self, element: &mut CanvasElement) {
        let patch = self;
        if let Some(kind) = patch.kind {
            element.kind = kind;
        }
        if let Some(left) = patch.left {
            element.left = left;
        }
        if let Some(top) = patch.top {
            element.top = top;
        }
        merge_optional!(patch => element:
            width, height, fill, stroke, stroke_width, opacity, rotation, scale_x, scale_y,
            text, font_size, font_family, font_weight, font_style, text_align, src,
            x1, y1, x2, y2,
        );
    }
}
