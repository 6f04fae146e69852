//! The element store - single owner of all placed elements.
//!
//! Elements are kept in placement order (the order they are exported in) and
//! addressed by [`ElementId`]. Every mutation goes through [`ElementStore`];
//! the interaction engine and properties editor never write fields directly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    Element, ElementId, ElementKind, Point, Styles, TableData, TemplateError, TemplateResult,
};

/// Partial update applied by [`ElementStore::update`].
///
/// `None` fields are left untouched. `styles` is merged key by key into the
/// existing map; `table_data` replaces the table wholesale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    /// New content.
    pub content: Option<String>,
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// Style properties to merge.
    pub styles: Option<Styles>,
    /// Replacement table model.
    pub table_data: Option<TableData>,
}

impl ElementPatch {
    /// Patch setting only `content`.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Patch setting only `name`.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Patch setting only `description`.
    #[must_use]
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Patch merging `styles`.
    #[must_use]
    pub fn styles(styles: Styles) -> Self {
        Self {
            styles: Some(styles),
            ..Self::default()
        }
    }

    /// Patch replacing the table model.
    #[must_use]
    pub fn table_data(table_data: TableData) -> Self {
        Self {
            table_data: Some(table_data),
            ..Self::default()
        }
    }
}

/// Ordered element list with a single optional selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementStore {
    elements: Vec<Element>,
    #[serde(skip)]
    selected: Option<ElementId>,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an element of `kind` at `position` and append it.
    pub fn create(&mut self, kind: ElementKind, position: Point) -> ElementId {
        let element = Element::new(kind, position);
        let id = element.id;
        tracing::debug!(%id, %kind, x = position.x, y = position.y, "Element created");
        self.elements.push(element);
        id
    }

    /// Apply a partial update.
    ///
    /// Unknown ids are ignored; returns whether an element was updated.
    pub fn update(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        let Some(element) = self.get_mut(id) else {
            tracing::debug!(%id, "Ignoring update for unknown element");
            return false;
        };

        if let Some(content) = patch.content {
            element.content = content;
        }
        if let Some(name) = patch.name {
            element.name = name;
        }
        if let Some(description) = patch.description {
            element.description = description;
        }
        if let Some(styles) = patch.styles {
            element.styles.merge(styles);
        }
        if let Some(mut table_data) = patch.table_data {
            if element.kind == ElementKind::Table {
                if table_data.normalize_rows() {
                    tracing::debug!(%id, "Normalized ragged table rows");
                }
                element.table_data = Some(table_data);
            } else {
                tracing::debug!(%id, kind = %element.kind, "Ignoring table data for non-table element");
            }
        }
        true
    }

    /// Select an element, or clear the selection with `None`.
    ///
    /// Selecting an unknown id clears the selection.
    pub fn select(&mut self, id: Option<ElementId>) {
        self.selected = id.filter(|id| self.get(*id).is_some());
    }

    /// Remove an element, clearing the selection if it was selected.
    ///
    /// Unknown ids are ignored; returns the removed element.
    pub fn delete(&mut self, id: ElementId) -> Option<Element> {
        let Some(index) = self.elements.iter().position(|e| e.id == id) else {
            tracing::debug!(%id, "Ignoring delete for unknown element");
            return None;
        };
        if self.selected == Some(id) {
            self.selected = None;
        }
        Some(self.elements.remove(index))
    }

    /// Get an element by ID.
    #[must_use]
    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// All elements in placement order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// The selected element ID.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// The selected element.
    #[must_use]
    pub fn selected_element(&self) -> Option<&Element> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialize the element list to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize an element list from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails, two elements share an id,
    /// or a table row does not have one cell per header.
    pub fn from_json(json: &str) -> TemplateResult<Self> {
        let store: Self = serde_json::from_str(json)?;
        store.validate()?;
        Ok(store)
    }

    fn validate(&self) -> TemplateResult<()> {
        let mut seen = HashSet::with_capacity(self.elements.len());
        for element in &self.elements {
            if !seen.insert(element.id) {
                return Err(TemplateError::DuplicateId(element.id.to_string()));
            }
            let Some(table) = &element.table_data else {
                continue;
            };
            let columns = table.column_count();
            if let Some(row) = table.body_rows.iter().find(|row| row.len() != columns) {
                return Err(TemplateError::InconsistentTable {
                    id: element.id.to_string(),
                    cells: row.len(),
                    columns,
                });
            }
        }
        Ok(())
    }
}
