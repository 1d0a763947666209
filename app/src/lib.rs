//! Lay images out on a virtual page, move, zoom and rotate them, then flatten
//! the arrangement into a single-page PDF.
//!
//! [`Editor`] is the controller a UI shell drives with pointer, scroll and key
//! events. [`compositor::compose`] turns its [`Scene`] into page-space draw
//! instructions and [`pdf::PdfWriter`] writes them out.

pub mod compositor;
pub mod decode;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod layout;
pub mod pdf;
pub mod placement;
pub mod scene;
pub mod settings;

pub use crate::compositor::{compose, ComposedPage, DrawInstruction};
pub use crate::editor::{AddReport, Editor};
pub use crate::error::{CollageError, Result};
pub use crate::geometry::{Point, Size, Transform};
pub use crate::interaction::{InteractionMode, PointerButton};
pub use crate::placement::{Placement, SourceImage};
pub use crate::scene::{PlacementId, Scene};
pub use crate::settings::{PageSize, Settings};
