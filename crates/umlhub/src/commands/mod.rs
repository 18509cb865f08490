//! CLI command implementations.

pub(crate) mod extract;
pub(crate) mod ingest;
pub(crate) mod serve;

pub(crate) use extract::ExtractArgs;
pub(crate) use ingest::IngestArgs;
pub(crate) use serve::ServeArgs;
