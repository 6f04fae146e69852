//! # Document Template Core
//!
//! Template model and serialization for the document template designer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                template-core                │
//! ├─────────────────────────────────────────────┤
//! │  Canvas Engine   │  Properties Editor       │
//! │  - Drag create   │  - Name / description    │
//! │  - Drag move     │  - Styles                │
//! │  - Resize        │  - Table columns / rows  │
//! ├─────────────────────────────────────────────┤
//! │           Element Store (single owner)      │
//! ├─────────────────────────────────────────────┤
//! │  Document Compiler  ──►  Table Codec        │
//! │  - HTML document         - Marker encode    │
//! │  - JSON description      - Structural decode│
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod compiler;
pub mod element;
pub mod error;
pub mod interaction;
pub mod properties;
pub mod store;
pub mod table;

pub use compiler::{
    compile, ColumnDescriptor, CompiledTemplate, ElementDescriptor, TemplateDocument,
    TemplateInfo, VALUE_PLACEHOLDER,
};
pub use element::{Element, ElementId, ElementKind, Geometry, Point, Styles};
pub use error::{TemplateError, TemplateResult};
pub use interaction::{CanvasEngine, CanvasSurface, GestureMode, ResizeHandle};
pub use properties::PropertiesEditor;
pub use store::{ElementPatch, ElementStore};
pub use table::{TableData, TableHeader};

/// Template core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
