//! `PlantUML` block handling for umlhub.
//!
//! This crate covers everything between a raw text blob and a rendered
//! diagram:
//! - [`Extractor`] finds `@startuml` … `@enduml` blocks in arbitrary text
//! - [`SyntaxCheckClient`] asks the syntax-check service whether a block is valid
//! - [`Classifier`] maps the checker's verdict to a [`DiagramType`](umlhub_model::DiagramType)
//! - [`RenderClient`] drives the two-phase render protocol (submit, then fetch
//!   SVG, PNG and text)
//!
//! The HTTP clients sit behind the [`SyntaxValidator`] and [`DiagramRenderer`]
//! traits so the indexing pipeline can be exercised without live services.
//!
//! # Example
//!
//! ```ignore
//! use umlhub_diagrams::{Extractor, RenderClient, DiagramRenderer};
//!
//! let extractor = Extractor::default();
//! let renderer = RenderClient::new("http://localhost:8080");
//!
//! for block in extractor.extract(&readme) {
//!     let artifact = renderer.render(block.text)?;
//!     println!("{} -> {}", block.start, artifact.render_id);
//! }
//! ```

mod classify;
mod consts;
mod error;
mod extract;
mod http;
mod render;
mod syntax;

pub use classify::{Classifier, DescriptionRule, KeywordRule};
pub use consts::{DEFAULT_TIMEOUT, END_MARKER, MIN_BLOCK_LENGTH, START_MARKER};
pub use error::{Service, ServiceError, ServiceErrorKind};
pub use extract::{Blocks, DiagramBlock, Extractor};
pub use http::create_agent;
pub use render::{DiagramRenderer, RenderClient, RenderSession};
pub use syntax::{SyntaxCheckClient, SyntaxCheckResult, SyntaxValidator};
