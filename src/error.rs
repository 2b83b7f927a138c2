use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// The page did not say which chapter it belongs to.
    #[error("chapter name was not provided")]
    MissingChapterName,
    #[error("could not read chapter catalog: {0}")]
    Catalog(String),
    #[error("store query failed: {0}")]
    Store(String),
    #[error("not signed in")]
    Unauthenticated,
}

#[cfg(feature = "ssr")]
impl From<diesel::result::Error> for DashboardError {
    fn from(e: diesel::result::Error) -> Self {
        DashboardError::Store(e.to_string())
    }
}
