//! Internal constants for block extraction and service calls.

use std::time::Duration;

/// Marker opening a `PlantUML` block.
pub const START_MARKER: &str = "@startuml";

/// Marker closing a `PlantUML` block (included in the extracted text).
pub const END_MARKER: &str = "@enduml";

/// Blocks shorter than this many characters are never indexed.
pub const MIN_BLOCK_LENGTH: usize = 50;

/// Default HTTP timeout for render and syntax-check requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Syntax-check endpoint, relative to the service base URL.
pub const CHECK_SYNTAX_PATH: &str = "/check_syntax";

/// Render submission endpoint, relative to the render base URL.
pub const FORM_PATH: &str = "/form";
