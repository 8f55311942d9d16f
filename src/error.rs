use crate::global_variables::Float;
use thiserror::Error;

pub type CfdResult<T> = Result<T, CfdError>;

#[derive(Error, Debug)]
pub enum CfdError {
    #[error("invalid value for `{name}`: {message}")]
    InvalidArgument { name: &'static str, message: String },

    /// The explicit vorticity update diverges at or above the limit.
    #[error("rescaled Reynolds number {reynolds} must be below {limit}")]
    UnstableReynolds { reynolds: Float, limit: Float },

    #[error("invalid geometry: {message}")]
    InvalidGeometry { message: String },

    #[error("non-finite residual at iteration {iteration}, the iteration diverged")]
    NonFiniteResidual { iteration: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl CfdError {
    pub fn invalid_argument(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            message: message.into(),
        }
    }
}
