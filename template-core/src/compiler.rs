//! Document compiler - element list to HTML document plus JSON description.
//!
//! One pass over the elements, in order. Each element yields its HTML (with
//! optional name/description comments in front) and a parallel
//! [`ElementDescriptor`] whose `content` is the same markup with the dynamic
//! payload replaced by [`VALUE_PLACEHOLDER`].
//!
//! Table columns are recovered from the freshly encoded table fragment by
//! splitting on [`SPLIT_SENTINEL`] and reading each marker between the first
//! `<marker>:` and the last `:<marker>` in the segment. A description or
//! value that itself contains a marker string therefore corrupts the
//! extracted columns, and a column without a name shares the previous
//! column's segment. Names and descriptions are written into HTML comments
//! unescaped, so a value containing `-->` closes the comment early and the
//! rest lands in the document as markup. Downstream consumers rely on this
//! exact format.

use serde::{Deserialize, Serialize};

use crate::codec::{self, DESCRIPTION_MARKER, NAME_MARKER, SPLIT_SENTINEL, VALUE_MARKER};
use crate::element::RENDER_ONLY_STYLES;
use crate::{Element, ElementKind, Styles, TemplateResult};

/// Stand-in for an element's dynamic payload in JSON content templates.
pub const VALUE_PLACEHOLDER: &str = "{{##Value##}}";

/// Everything before the element markup.
pub const DOCUMENT_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Document Template</title>
<style>
body { margin: 0; font-family: Arial, sans-serif; }
.canvas-container { position: relative; width: 100%; min-height: 100vh; }
table { border-collapse: collapse; }
th, td { border: 1px solid #cccccc; padding: 4px; }
</style>
</head>
<body>
<div class="canvas-container">
"#;

/// Everything after the element markup.
pub const DOCUMENT_FOOTER: &str = "</div>\n</body>\n</html>\n";

/// Template name and description entered at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Template name.
    pub name: String,
    /// Template description.
    pub description: String,
}

impl TemplateInfo {
    /// Create template info.
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// JSON description of one table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Always `"column"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Column name as written in the name marker.
    pub column_name: String,
    /// Column description.
    pub column_description: String,
    /// Visible header value.
    pub column_value: String,
    /// Header cell markup with the value replaced by the placeholder.
    pub column_content: String,
}

/// JSON description of one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Element id.
    pub id: String,
    /// Element type.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Semantic name.
    pub name: String,
    /// Semantic description.
    pub description: String,
    /// Element markup with [`VALUE_PLACEHOLDER`] for the payload.
    pub content: String,
    /// The payload the placeholder stands for.
    pub value: String,
    /// Table columns; present only for tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDescriptor>>,
}

/// JSON document exported next to the HTML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDocument {
    /// HTML before the elements.
    pub header: String,
    /// Element descriptors, in element order.
    pub elements: Vec<ElementDescriptor>,
    /// HTML after the elements.
    pub footer: String,
    /// Template name.
    pub name: String,
    /// Template description.
    pub description: String,
}

/// Output of [`compile`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTemplate {
    /// Complete HTML document.
    pub html: String,
    /// Parallel JSON description.
    pub document: TemplateDocument,
}

impl CompiledTemplate {
    /// The JSON description as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string(&self.document)?)
    }
}

/// Compile elements into an HTML document and its JSON description.
#[must_use]
pub fn compile(elements: &[Element], info: &TemplateInfo) -> CompiledTemplate {
    let mut html = String::from(DOCUMENT_HEADER);
    let mut descriptors = Vec::with_capacity(elements.len());

    for element in elements {
        let (markup, descriptor) = compile_element(element);
        html.push_str(&metadata_comments(element));
        html.push_str(&markup);
        html.push('\n');
        descriptors.push(descriptor);
    }
    html.push_str(DOCUMENT_FOOTER);

    tracing::debug!(elements = descriptors.len(), bytes = html.len(), "Template compiled");

    CompiledTemplate {
        html,
        document: TemplateDocument {
            header: DOCUMENT_HEADER.to_string(),
            elements: descriptors,
            footer: DOCUMENT_FOOTER.to_string(),
            name: info.name.clone(),
            description: info.description.clone(),
        },
    }
}

fn metadata_comments(element: &Element) -> String {
    let mut comments = String::new();
    if !element.name.is_empty() {
        comments.push_str(&format!(
            "<!-- Element Name: {} -->\n",
            codec::normalize_name(&element.name)
        ));
    }
    if !element.description.is_empty() {
        comments.push_str(&format!("<!-- Description: {} -->\n", element.description));
    }
    comments
}

/// Markup for one element plus its descriptor.
fn compile_element(element: &Element) -> (String, ElementDescriptor) {
    let style = style_attribute(&element.styles);
    let tag = element.kind.tag();
    let mut columns = None;

    // (template with the placeholder, payload)
    let (template, value) = match element.kind {
        ElementKind::Image => (
            format!("<img src=\"{VALUE_PLACEHOLDER}\" style=\"{style}\" />"),
            escape_attribute(element.styles.get("src").unwrap_or_default()),
        ),
        ElementKind::HorizontalRule => (format!("<hr style=\"{style}\" />"), String::new()),
        ElementKind::VerticalRule => (format!("<div style=\"{style}\"></div>"), String::new()),
        ElementKind::Table => {
            let fragment = element
                .table_data
                .as_ref()
                .map(codec::encode)
                .unwrap_or_default();
            columns = Some(extract_columns(&fragment));
            (
                format!("<table style=\"{style}\">{VALUE_PLACEHOLDER}</table>"),
                fragment,
            )
        }
        ElementKind::TextBlock | ElementKind::Paragraph | ElementKind::Heading => (
            format!("<{tag} style=\"{style}\">{VALUE_PLACEHOLDER}</{tag}>"),
            element.content.clone(),
        ),
    };

    let markup = template.replacen(VALUE_PLACEHOLDER, &value, 1);
    let descriptor = ElementDescriptor {
        id: element.id.to_string(),
        kind: element.kind,
        name: element.name.clone(),
        description: element.description.clone(),
        content: template,
        value,
        columns,
    };
    (markup, descriptor)
}

/// Serialize styles as `key: value;` pairs, kebab-casing the keys.
///
/// Render-only hints (`minWidth`, `minHeight`) are left out.
#[must_use]
pub fn style_attribute(styles: &Styles) -> String {
    styles
        .iter()
        .filter(|(key, _)| !RENDER_ONLY_STYLES.contains(key))
        .map(|(key, value)| format!("{}: {};", kebab_case(key), escape_attribute(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// `backgroundColor` -> `background-color`.
#[must_use]
pub fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

/// Rebuild column descriptors from an encoded table fragment.
#[must_use]
pub fn extract_columns(fragment: &str) -> Vec<ColumnDescriptor> {
    let value_open = format!("{VALUE_MARKER}:");
    fragment
        .split(SPLIT_SENTINEL)
        .filter(|segment| segment.contains(&value_open))
        .map(|segment| ColumnDescriptor {
            kind: "column".to_string(),
            column_name: marker_value(segment, NAME_MARKER),
            column_description: marker_value(segment, DESCRIPTION_MARKER),
            column_value: marker_value(segment, VALUE_MARKER),
            column_content: header_cell_template(segment),
        })
        .collect()
}

/// Text between the first `<marker>:` and the last `:<marker>`.
fn marker_value(segment: &str, marker: &str) -> String {
    let open = format!("{marker}:");
    let close = format!(":{marker}");
    let Some(start) = segment.find(&open).map(|i| i + open.len()) else {
        return String::new();
    };
    match segment.rfind(&close) {
        Some(end) if end >= start => segment[start..end].to_string(),
        _ => String::new(),
    }
}

/// First `<th ...>` of the segment with its content replaced by the placeholder.
fn header_cell_template(segment: &str) -> String {
    let Some(open) = segment.find("<th") else {
        return String::new();
    };
    let Some(open_end) = segment[open..].find('>').map(|i| open + i) else {
        return String::new();
    };
    format!("{}{VALUE_PLACEHOLDER}</th>", &segment[open..=open_end])
}
