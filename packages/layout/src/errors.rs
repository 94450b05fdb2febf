use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Layout cancelled: generation {0} is stale")]
    Cancelled(u64),

    #[error("Layout worker failed: {0}")]
    Worker(String),
}
