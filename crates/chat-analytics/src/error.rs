use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart backend error: {0}")]
    Backend(String),

    #[error("Chart has {labels} x labels but a series of length {values}")]
    LengthMismatch { labels: usize, values: usize },

    #[error("Series {series} spans more than {limit} buckets")]
    TooManyBuckets { series: String, limit: usize },
}

impl RenderError {
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        RenderError::Backend(err.to_string())
    }
}
