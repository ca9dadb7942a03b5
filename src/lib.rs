//! Turns declarative, data-bound page specifications into paginated PDF.
//!
//! A [GenerationRequest] is composed in two passes by the [Engine]: the first
//! measures every data-bound table, the second builds the final render tree
//! using those measurements. A [RenderBackend] then flows the tree onto
//! physical pages and serialises it.

pub mod backend;
pub mod binding;
pub mod compositor;
pub mod config;
pub mod element;
pub mod engine;
pub mod fetch;
pub mod font;
pub mod image;
pub mod layout;
pub mod model;
pub mod pagination;
pub mod registry;
pub mod style;
pub mod table;
pub mod tree;

mod colour;
pub use colour::*;

mod content;

mod document;
pub use document::*;

mod info;
pub use info::*;

mod page;
pub use page::*;

mod pagesize;
pub use pagesize::*;

mod rect;
pub use rect::*;

pub(crate) mod refs;

mod units;
pub use units::*;

mod error;
pub use error::*;

pub use backend::{PdfBackend, RenderBackend};
pub use config::EngineConfig;
pub use engine::Engine;
pub use fetch::{FetchError, Fetcher, HttpFetcher, InMemoryFetcher, OfflineFetcher};
pub use font::{FontCache, FontHandle};
pub use model::{GenerationRequest, PageDefinition, PaginationOverrides};
pub use tree::ComposedDocument;

/// Re-export PDF-writer functionality
pub use pdf_writer;
