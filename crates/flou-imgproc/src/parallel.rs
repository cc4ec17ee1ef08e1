use rayon::prelude::*;
use thiserror::Error;

/// Errors that can occur during parallel execution.
#[derive(Error, Debug, PartialEq)]
pub enum ParallelError {
    /// The thread pool failed to build.
    #[error("failed to build thread pool: {0}")]
    BuildError(String),

    /// The requested thread count is invalid.
    #[error("thread count must be > 0, got {0}")]
    InvalidThreadCount(usize),

    /// The row stride must be valid.
    #[error("row stride must be > 0, got {0}")]
    InvalidRowStride(usize),

    /// The destination length is not a multiple of the row stride.
    #[error("destination length {0} is not a multiple of the row stride {1}")]
    SizeMismatch(usize, usize),

    /// The strategy name could not be parsed.
    #[error("unknown execution strategy: {0} (expected serial, rows or fixed:<n>)")]
    UnknownStrategy(String),
}

/// Controls how row tasks are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStrategy {
    /// Use the global Rayon thread pool to process rows in parallel.
    ///
    /// The pool holds one worker per hardware thread, so at most that many
    /// rows run at the same time however tall the image is.
    #[default]
    ParallelRows,

    /// Run sequentially on the current thread, row after row.
    ///
    /// Useful for small images, debugging, or as a reference when checking
    /// that the parallel schedule does not change the output.
    Serial,

    /// Run on a local thread pool with `n` threads.
    ///
    /// # Warning
    /// Creates a new thread pool on every call, which has significant overhead.
    /// Use this primarily for benchmarking or specific isolation needs.
    Fixed(usize),
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionStrategy::ParallelRows => write!(f, "rows"),
            ExecutionStrategy::Serial => write!(f, "serial"),
            ExecutionStrategy::Fixed(n) => write!(f, "fixed:{n}"),
        }
    }
}

impl std::str::FromStr for ExecutionStrategy {
    type Err = ParallelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "serial" => Ok(ExecutionStrategy::Serial),
            "rows" | "parallel" => Ok(ExecutionStrategy::ParallelRows),
            _ => {
                let n = s
                    .strip_prefix("fixed:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| ParallelError::UnknownStrategy(s.clone()))?;
                Ok(ExecutionStrategy::Fixed(n))
            }
        }
    }
}

/// Apply a function to every row of a destination buffer.
///
/// The buffer is split into disjoint `row_stride`-long chunks, and `f` receives
/// the row index together with exclusive access to that row. The call returns
/// once every row has been processed.
///
/// # Arguments
///
/// * `dst` - The destination buffer, `rows * row_stride` long.
/// * `row_stride` - The number of elements in one row.
/// * `strategy` - The execution strategy.
/// * `f` - The operation to perform on each `(row_index, row)` pair.
///
/// # Errors
///
/// Fails without calling `f` if the stride is zero, the buffer length is not a
/// multiple of the stride, or a fixed pool cannot be built.
pub fn for_each_row_mut<T, F>(
    dst: &mut [T],
    row_stride: usize,
    strategy: ExecutionStrategy,
    f: F,
) -> Result<(), ParallelError>
where
    T: Send,
    F: Fn(usize, &mut [T]) + Send + Sync,
{
    if row_stride == 0 {
        return Err(ParallelError::InvalidRowStride(row_stride));
    }

    if dst.len() % row_stride != 0 {
        return Err(ParallelError::SizeMismatch(dst.len(), row_stride));
    }

    match strategy {
        ExecutionStrategy::Serial => {
            dst.chunks_exact_mut(row_stride)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        }
        ExecutionStrategy::ParallelRows => {
            dst.par_chunks_exact_mut(row_stride)
                .enumerate()
                .for_each(|(y, row)| f(y, row));
        }
        ExecutionStrategy::Fixed(n) => {
            if n == 0 {
                return Err(ParallelError::InvalidThreadCount(n));
            }
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| ParallelError::BuildError(e.to_string()))?;

            pool.install(|| {
                dst.par_chunks_exact_mut(row_stride)
                    .enumerate()
                    .for_each(|(y, row)| f(y, row));
            });
        }
    }
    Ok(())
}
