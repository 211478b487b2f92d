//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;
use turbulence_core::{CorpusFormat, CorpusLoader, ListShape, TokenDistribution};

pub mod compare;
pub mod info;
pub mod rank;
#[cfg(feature = "mcp")]
pub mod serve;
pub mod trend;

/// Load one distribution file, enforcing the configured size limit.
///
/// Shared by every command that reads corpora so format inference, list
/// shape and the size preflight behave the same everywhere.
pub fn load_distribution(
    path: &Utf8Path,
    format: Option<CorpusFormat>,
    shape: ListShape,
    max_bytes: Option<usize>,
) -> anyhow::Result<TokenDistribution> {
    CorpusLoader::new()
        .with_format(format)
        .with_shape(shape)
        .with_max_bytes(max_bytes)
        .load(path)
        .with_context(|| format!("failed to load distribution from {path}"))
}
