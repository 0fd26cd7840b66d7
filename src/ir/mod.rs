//! Core annotation types shared by the generators, preprocessing and the CLI.
//!
//! # Design Principles
//!
//! 1. **Two ID spaces**: external category ids ([`CocoCategoryId`]) and dense
//!    training labels ([`Label`]) are distinct newtypes, bridged only by an
//!    explicitly constructed [`LabelTable`].
//!
//! 2. **Canonical Format**: boxes are always XYXY in absolute pixels. COCO's
//!    XYWH form is converted at the parsing boundary.
//!
//! 3. **Permissive Construction**: boxes may be degenerate. Callers that need
//!    positive area filter explicitly.
//!
//! # Example
//!
//! ```
//! use retinakit::ir::{Category, CocoCategoryId, Label, LabelTable};
//!
//! let table = LabelTable::from_categories(&[
//!     Category::new(5u64, "a"),
//!     Category::new(2u64, "b"),
//! ])?;
//! assert_eq!(table.label_to_coco_label(Label::new(0))?, CocoCategoryId::new(2));
//! # Ok::<(), retinakit::RetinaError>(())
//! ```

mod bbox;
mod ids;
pub mod io_coco_json;
mod labels;
mod model;

// Re-export core types for convenient access
pub use bbox::BBoxXYXY;
pub use ids::{CocoCategoryId, ImageId, Label};
pub use labels::{LabelEntry, LabelTable};
pub use model::{Category, ImageRecord, ObjectAnnotation};
