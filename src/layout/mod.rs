//! Geometry of the render tree: sizing, text wrapping and placement on pages.
//!
//! Layout happens in two steps. [measure](crate::layout::height) sizes
//! elements for a given width, reporting the widths of keyed tables and
//! columns to a [WidthObserver](crate::layout::WidthObserver) on the way; the
//! measurement pass of the compositor uses this to fill its registry.
//! [paginate](crate::layout::paginate) then places a composed document onto
//! physical pages as a list of drawing [Primitive](crate::layout::Primitive)s
//! for a rendering backend to encode.

mod flow;
mod margins;
mod measure;
mod pages;
mod text;

pub use flow::*;
pub use margins::*;
pub use measure::*;
pub use pages::*;
pub use text::*;
