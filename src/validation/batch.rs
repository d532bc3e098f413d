use rayon::prelude::*;

use crate::foundation::error::{KinoError, KinoResult};
use crate::path::PathPtr;
use crate::validation::{PathValidation, ValidationReport};

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchThreading {
    /// Worker count; `None` lets rayon decide.
    pub threads: Option<usize>,
}

/// Validate independent paths in parallel. Reports come back in input order; the first error
/// (in input order) aborts the batch.
#[tracing::instrument(level = "debug", skip(validation, paths), fields(paths = paths.len()))]
pub fn validate_all(
    validation: &dyn PathValidation,
    paths: &[PathPtr],
    reverse: bool,
    threading: &BatchThreading,
) -> KinoResult<Vec<ValidationReport>> {
    let pool = build_thread_pool(threading.threads)?;
    let reports = pool.install(|| {
        paths
            .par_iter()
            .map(|path| validation.validate(path, reverse))
            .collect::<Vec<_>>()
    });
    reports.into_iter().collect()
}

fn build_thread_pool(threads: Option<usize>) -> KinoResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(KinoError::validation(
            "batch threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| KinoError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/validation/batch.rs"]
mod tests;
