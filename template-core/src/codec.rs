//! Table codec - [`TableData`] to HTML fragment and back.
//!
//! Encoding embeds each header's semantic metadata in HTML comments placed
//! directly before its `<th>`:
//!
//! ```text
//! {{SPLIT}}<!-- ##Column Name##:Col_1:##Column Name## -->
//! <!-- ##Column Description##:d1:##Column Description## -->
//! <!-- ##Column Value##:A:##Column Value## --><th style="width: 100%;">A</th>
//! ```
//!
//! (shown wrapped; the real output has no line breaks). Decoding is
//! structural only: it reads cell markup and regenerates positional
//! name/description defaults. The markers are never read back from HTML;
//! column metadata lives in the in-memory model.

use scraper::{ElementRef, Html};

use crate::table::{TableData, TableHeader};

/// Segment boundary emitted before every name marker.
pub const SPLIT_SENTINEL: &str = "{{SPLIT}}";
/// Delimiter of the column name marker.
pub const NAME_MARKER: &str = "##Column Name##";
/// Delimiter of the column description marker.
pub const DESCRIPTION_MARKER: &str = "##Column Description##";
/// Delimiter of the column value marker.
pub const VALUE_MARKER: &str = "##Column Value##";

/// Normalize a semantic name for export.
///
/// Only the first space becomes `_`; later spaces are kept. Downstream
/// consumers match on this exact form.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.replacen(' ', "_", 1)
}

/// Render a marker comment, `<!-- <marker>:<value>:<marker> -->`.
///
/// `value` is written as-is; a `-->` inside it ends the comment.
#[must_use]
pub fn marker_comment(marker: &str, value: &str) -> String {
    format!("<!-- {marker}:{value}:{marker} -->")
}

/// Uniform cell width for `columns` columns.
#[must_use]
pub fn column_width(columns: usize) -> String {
    if columns == 0 {
        "auto".to_string()
    } else {
        #[allow(clippy::cast_precision_loss)]
        let percent = 100.0 / columns as f64;
        format!("{percent}%")
    }
}

/// Encode a table into the fragment placed inside `<table>`.
#[must_use]
pub fn encode(table: &TableData) -> String {
    let width = column_width(table.headers.len());
    let mut html = String::new();

    if !table.headers.is_empty() {
        html.push_str("<thead><tr>");
        for header in &table.headers {
            if !header.name.is_empty() {
                html.push_str(SPLIT_SENTINEL);
                html.push_str(&marker_comment(NAME_MARKER, &normalize_name(&header.name)));
            }
            if !header.description.is_empty() {
                html.push_str(&marker_comment(DESCRIPTION_MARKER, &header.description));
            }
            html.push_str(&marker_comment(VALUE_MARKER, &header.content));
            html.push_str(&format!(
                "<th style=\"width: {width};\">{}</th>",
                header.content
            ));
        }
        html.push_str("</tr></thead>");
    }

    if !table.body_rows.is_empty() {
        html.push_str("<tbody>");
        for row in &table.body_rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str(&format!("<td style=\"width: {width};\">{cell}</td>"));
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");
    }

    html
}

/// Structurally decode table markup into headers and body rows.
///
/// Accepts either a full `<table>` or the inner fragment produced by
/// [`encode`]. Header names and descriptions are positional defaults
/// (`Column N`, `Description for column N`). Markup without table cells
/// decodes to an empty table.
#[must_use]
pub fn decode(html: &str) -> TableData {
    let markup = if html.to_ascii_lowercase().contains("<table") {
        html.to_string()
    } else {
        format!("<table>{html}</table>")
    };
    let fragment = Html::parse_fragment(&markup);

    let mut header_cells: Vec<String> = Vec::new();
    let mut body_rows: Vec<Vec<String>> = Vec::new();

    let rows = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr");

    for row in rows {
        let cells: Vec<ElementRef<'_>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| matches!(el.value().name(), "th" | "td"))
            .collect();
        if cells.is_empty() {
            continue;
        }

        let all_headers = cells.iter().all(|el| el.value().name() == "th");
        if all_headers && header_cells.is_empty() && body_rows.is_empty() {
            header_cells = cells.iter().map(|el| el.inner_html()).collect();
        } else {
            body_rows.push(cells.iter().map(|el| el.inner_html()).collect());
        }
    }

    // Keep the row-length invariant for ragged or header-less markup.
    let columns = if header_cells.is_empty() {
        body_rows.iter().map(Vec::len).max().unwrap_or(0)
    } else {
        header_cells.len()
    };
    header_cells.resize(columns, String::new());

    let headers = header_cells
        .into_iter()
        .enumerate()
        .map(|(i, content)| {
            TableHeader::new(
                content,
                format!("Column {}", i + 1),
                format!("Description for column {}", i + 1),
            )
        })
        .collect();

    let mut table = TableData { headers, body_rows };
    table.normalize_rows();
    tracing::debug!(rows = table.row_count(), "Decoded table markup");
    table
}
