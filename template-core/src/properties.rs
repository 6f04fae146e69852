//! Properties editor - form surface over the selected element.
//!
//! Every edit writes straight through to the [`ElementStore`]; there is no
//! pending state and no save step. Table edits copy the selected table,
//! change the copy and hand it back as one replacement so headers and rows
//! never disagree.

use crate::{
    codec, Element, ElementId, ElementKind, ElementPatch, ElementStore, Styles, TableData,
    TemplateError, TemplateResult,
};

/// An editable style property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleField {
    /// camelCase style key.
    pub key: &'static str,
    /// Form label.
    pub label: &'static str,
}

const fn field(key: &'static str, label: &'static str) -> StyleField {
    StyleField { key, label }
}

const TEXT_STYLES: &[StyleField] = &[
    field("color", "Text Color"),
    field("backgroundColor", "Background Color"),
    field("fontSize", "Font Size"),
    field("width", "Width"),
    field("height", "Height"),
    field("flexDirection", "Flex Direction"),
    field("justifyContent", "Justify Content"),
    field("alignItems", "Align Items"),
];

const IMAGE_STYLES: &[StyleField] = &[
    field("src", "Image URL"),
    field("width", "Width"),
    field("height", "Height"),
];

const TABLE_STYLES: &[StyleField] = &[
    field("width", "Width"),
    field("height", "Height"),
    field("textAlign", "Text Align"),
];

const RULE_STYLES: &[StyleField] = &[
    field("width", "Width"),
    field("height", "Height"),
    field("backgroundColor", "Color"),
];

/// Style fields offered for an element kind.
#[must_use]
pub fn style_fields(kind: ElementKind) -> &'static [StyleField] {
    match kind {
        ElementKind::TextBlock | ElementKind::Paragraph | ElementKind::Heading => TEXT_STYLES,
        ElementKind::Image => IMAGE_STYLES,
        ElementKind::Table => TABLE_STYLES,
        ElementKind::HorizontalRule | ElementKind::VerticalRule => RULE_STYLES,
    }
}

/// A control shown on the properties form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    /// Semantic name.
    Name,
    /// Semantic description.
    Description,
    /// Text content.
    Content,
    /// A style property.
    Style(StyleField),
    /// Column editor (tables only).
    Columns,
}

/// Controls shown for an element kind, in form order.
#[must_use]
pub fn visible_fields(kind: ElementKind) -> Vec<FormField> {
    let mut fields = vec![FormField::Name, FormField::Description];
    if kind.has_content() {
        fields.push(FormField::Content);
    }
    fields.extend(style_fields(kind).iter().copied().map(FormField::Style));
    if kind == ElementKind::Table {
        fields.push(FormField::Columns);
    }
    fields
}

/// Editor bound to the store's current selection.
#[derive(Debug)]
pub struct PropertiesEditor<'a> {
    store: &'a mut ElementStore,
}

impl<'a> PropertiesEditor<'a> {
    /// Bind an editor to `store`.
    pub fn new(store: &'a mut ElementStore) -> Self {
        Self { store }
    }

    /// The element being edited.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] when nothing is selected.
    pub fn element(&self) -> TemplateResult<&Element> {
        self.store
            .selected_element()
            .ok_or(TemplateError::NoSelection)
    }

    fn selected_id(&self) -> TemplateResult<ElementId> {
        self.element().map(|e| e.id)
    }

    fn apply(&mut self, patch: ElementPatch) -> TemplateResult<()> {
        let id = self.selected_id()?;
        self.store.update(id, patch);
        Ok(())
    }

    /// Set the semantic name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] when nothing is selected.
    pub fn set_name(&mut self, name: &str) -> TemplateResult<()> {
        self.apply(ElementPatch::name(name))
    }

    /// Set the semantic description.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] when nothing is selected.
    pub fn set_description(&mut self, description: &str) -> TemplateResult<()> {
        self.apply(ElementPatch::description(description))
    }

    /// Set the text content.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] when nothing is selected and
    /// [`TemplateError::FieldNotEditable`] for images, rules and tables.
    pub fn set_content(&mut self, content: &str) -> TemplateResult<()> {
        let kind = self.element()?.kind;
        if !kind.has_content() {
            return Err(TemplateError::FieldNotEditable {
                field: "content",
                kind: kind.to_string(),
            });
        }
        self.apply(ElementPatch::content(content))
    }

    /// Set one style property.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] when nothing is selected.
    pub fn set_style(&mut self, key: &str, value: &str) -> TemplateResult<()> {
        self.apply(ElementPatch::styles(Styles::new().with(key, value)))
    }

    fn edit_table<F>(&mut self, edit: F) -> TemplateResult<()>
    where
        F: FnOnce(&mut TableData) -> TemplateResult<()>,
    {
        let element = self.element()?;
        if element.kind != ElementKind::Table {
            return Err(TemplateError::NotATable(element.id.to_string()));
        }
        let id = element.id;
        let mut table = element.table_data.clone().unwrap_or_default();
        edit(&mut table)?;
        self.store.update(id, ElementPatch::table_data(table));
        Ok(())
    }

    /// Append a column with default header and cells.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] or [`TemplateError::NotATable`].
    pub fn add_column(&mut self) -> TemplateResult<()> {
        self.edit_table(|table| {
            table.add_column();
            Ok(())
        })
    }

    /// Remove the last column; removing the only column empties the table.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] or [`TemplateError::NotATable`].
    pub fn remove_last_column(&mut self) -> TemplateResult<()> {
        self.edit_table(|table| {
            table.remove_last_column();
            Ok(())
        })
    }

    /// Append a body row.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] or [`TemplateError::NotATable`].
    pub fn add_row(&mut self) -> TemplateResult<()> {
        self.edit_table(|table| {
            table.add_row();
            Ok(())
        })
    }

    /// Remove the last body row.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] or [`TemplateError::NotATable`].
    pub fn remove_last_row(&mut self) -> TemplateResult<()> {
        self.edit_table(|table| {
            table.remove_last_row();
            Ok(())
        })
    }

    /// Set a header's visible content.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`], [`TemplateError::NotATable`]
    /// or [`TemplateError::ColumnOutOfRange`].
    pub fn set_header_content(&mut self, column: usize, content: &str) -> TemplateResult<()> {
        self.edit_table(|table| table.set_header_content(column, content))
    }

    /// Set a header's semantic name.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`], [`TemplateError::NotATable`]
    /// or [`TemplateError::ColumnOutOfRange`].
    pub fn set_header_name(&mut self, column: usize, name: &str) -> TemplateResult<()> {
        self.edit_table(|table| table.set_header_name(column, name))
    }

    /// Set a header's semantic description.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`], [`TemplateError::NotATable`]
    /// or [`TemplateError::ColumnOutOfRange`].
    pub fn set_header_description(
        &mut self,
        column: usize,
        description: &str,
    ) -> TemplateResult<()> {
        self.edit_table(|table| table.set_header_description(column, description))
    }

    /// Set one body cell.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`], [`TemplateError::NotATable`],
    /// [`TemplateError::RowOutOfRange`] or [`TemplateError::ColumnOutOfRange`].
    pub fn set_cell(&mut self, row: usize, column: usize, content: &str) -> TemplateResult<()> {
        self.edit_table(|table| table.set_cell(row, column, content))
    }

    /// Replace the table with one decoded from raw markup.
    ///
    /// Only structure survives; names and descriptions become positional
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NoSelection`] or [`TemplateError::NotATable`].
    pub fn load_table_markup(&mut self, html: &str) -> TemplateResult<()> {
        self.edit_table(|table| {
            *table = codec::decode(html);
            Ok(())
        })
    }
}
