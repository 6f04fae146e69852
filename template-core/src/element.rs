//! Template elements - the items placed on the design canvas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::table::TableData;

/// Placeholder image shown for freshly created image elements.
pub const PLACEHOLDER_IMAGE_SRC: &str = "https://via.placeholder.com/100";

/// Style keys that only matter while editing and never reach exported output.
pub const RENDER_ONLY_STYLES: [&str; 2] = ["minWidth", "minHeight"];

/// Unique identifier for an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Uuid);

impl ElementId {
    /// Create a new unique element ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse an element ID from its string form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of element types a template can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementKind {
    /// A generic block of text.
    TextBlock,
    /// A paragraph.
    Paragraph,
    /// A heading.
    Heading,
    /// An image referenced by `styles.src`.
    Image,
    /// A table backed by [`TableData`].
    Table,
    /// A horizontal separator bar.
    HorizontalRule,
    /// A vertical separator bar.
    VerticalRule,
}

impl ElementKind {
    /// Creatable kinds in palette order.
    pub const PALETTE: [ElementKind; 7] = [
        Self::TextBlock,
        Self::Paragraph,
        Self::Heading,
        Self::Image,
        Self::Table,
        Self::HorizontalRule,
        Self::VerticalRule,
    ];

    /// Label shown on the palette.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::TextBlock => "Text Block",
            Self::Paragraph => "Paragraph",
            Self::Heading => "Heading",
            Self::Image => "Image",
            Self::Table => "Table",
            Self::HorizontalRule => "Horizontal Rule",
            Self::VerticalRule => "Vertical Rule",
        }
    }

    /// HTML tag this kind compiles to.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TextBlock | Self::VerticalRule => "div",
            Self::Paragraph => "p",
            Self::Heading => "h1",
            Self::Image => "img",
            Self::Table => "table",
            Self::HorizontalRule => "hr",
        }
    }

    /// Serialized name (`text-block`, `paragraph`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextBlock => "text-block",
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Table => "table",
            Self::HorizontalRule => "horizontal-rule",
            Self::VerticalRule => "vertical-rule",
        }
    }

    /// Whether the element carries an editable `content` payload.
    #[must_use]
    pub const fn has_content(self) -> bool {
        matches!(self, Self::TextBlock | Self::Paragraph | Self::Heading)
    }

    /// Whether this kind is a separator bar.
    #[must_use]
    pub const fn is_rule(self) -> bool {
        matches!(self, Self::HorizontalRule | Self::VerticalRule)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Authoritative geometry of an element, in canvas pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Distance from the canvas left edge.
    pub left: f32,
    /// Distance from the canvas top edge.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

/// Mapping from camelCase style property to its CSS value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Styles(BTreeMap<String, String>);

impl Styles {
    /// Create an empty style map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder form of [`Styles::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Shallow-merge `other` into this map; keys in `other` win.
    pub fn merge(&mut self, other: Styles) {
        self.0.extend(other.0);
    }

    /// Iterate over properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a pixel value such as `"120px"` or `"120"`.
    #[must_use]
    pub fn px(&self, key: &str) -> Option<f32> {
        let raw = self.get(key)?.trim();
        raw.strip_suffix("px").unwrap_or(raw).trim().parse().ok()
    }

    /// Write a pixel value.
    pub fn set_px(&mut self, key: &str, value: f32) {
        self.set(key, format_px(value));
    }

    /// Resolve a length in pixels; percentages are taken of `reference`.
    #[must_use]
    pub fn length(&self, key: &str, reference: f32) -> Option<f32> {
        let raw = self.get(key)?.trim();
        match raw.strip_suffix('%') {
            Some(percent) => percent.trim().parse::<f32>().ok().map(|p| reference * p / 100.0),
            None => self.px(key),
        }
    }

    /// Geometry read from `left`/`top`/`width`/`height` inside a container.
    ///
    /// Position defaults to 0. Percentages resolve against the container and
    /// any other non-pixel size (`auto`) falls back to `fallback_size`.
    #[must_use]
    pub fn geometry(&self, container: (f32, f32), fallback_size: f32) -> Geometry {
        let (container_width, container_height) = container;
        Geometry {
            left: self.length("left", container_width).unwrap_or(0.0),
            top: self.length("top", container_height).unwrap_or(0.0),
            width: self.length("width", container_width).unwrap_or(fallback_size),
            height: self.length("height", container_height).unwrap_or(fallback_size),
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Styles {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Format a pixel value the way the editor writes them (`50px`, `12.5px`).
#[must_use]
pub fn format_px(value: f32) -> String {
    format!("{value}px")
}

/// A placed template element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique identifier.
    pub id: ElementId,
    /// Element type, fixed at creation.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Text/HTML payload; empty for images, rules and tables.
    #[serde(default)]
    pub content: String,
    /// Semantic name.
    #[serde(default)]
    pub name: String,
    /// Semantic description.
    #[serde(default)]
    pub description: String,
    /// Style properties, including geometry.
    #[serde(default)]
    pub styles: Styles,
    /// Table model; present only for tables.
    #[serde(default)]
    pub table_data: Option<TableData>,
}

impl Element {
    /// Create an element of `kind` at `position` with its per-type defaults.
    #[must_use]
    pub fn new(kind: ElementKind, position: Point) -> Self {
        let content = if kind.has_content() {
            format!("New {}", kind.label().to_lowercase())
        } else {
            String::new()
        };

        Self {
            id: ElementId::new(),
            kind,
            content,
            name: kind.label().to_string(),
            description: format!("Description for {}", kind.label().to_lowercase()),
            styles: default_styles(kind, position),
            table_data: (kind == ElementKind::Table).then(TableData::default),
        }
    }
}

fn default_styles(kind: ElementKind, position: Point) -> Styles {
    let mut styles = Styles::new().with("position", "absolute");
    styles.set_px("left", position.x);
    styles.set_px("top", position.y);

    match kind {
        ElementKind::TextBlock | ElementKind::Paragraph | ElementKind::Heading => {
            let font_size = if kind == ElementKind::Heading { "24px" } else { "16px" };
            styles
                .with("width", "200px")
                .with("height", "50px")
                .with("minWidth", "50px")
                .with("minHeight", "20px")
                .with("display", "flex")
                .with("flexDirection", "column")
                .with("justifyContent", "flex-start")
                .with("alignItems", "flex-start")
                .with("color", "#000000")
                .with("fontSize", font_size)
                .with("margin", "0")
        }
        ElementKind::Image => styles
            .with("width", "100px")
            .with("height", "100px")
            .with("objectFit", "cover")
            .with("src", PLACEHOLDER_IMAGE_SRC),
        ElementKind::Table => styles
            .with("display", "block")
            .with("width", "100%")
            .with("height", "auto")
            .with("textAlign", "right")
            .with("borderCollapse", "collapse"),
        ElementKind::HorizontalRule => styles
            .with("width", "150px")
            .with("height", "2px")
            .with("backgroundColor", "#000000")
            .with("border", "none")
            .with("margin", "0"),
        ElementKind::VerticalRule => styles
            .with("width", "2px")
            .with("height", "100px")
            .with("backgroundColor", "#000000"),
    }
}
