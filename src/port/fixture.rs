use thiserror::Error;

use crate::domain::fixture::FixtureRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("fixture store unavailable: {0}")]
    Unavailable(String)
}

/// Persistence used by the fixture commands
///
/// Implementations are shared between commands running on different worker threads.
pub trait FixtureStore: Send + Sync {
    /// Insert or replace every record, returning what was stored
    fn save_all(&self, records: Vec<FixtureRecord>) -> Result<Vec<FixtureRecord>, StoreError>;

    /// Remove the given records by id, returning how many existed
    fn delete_all(&self, records: &[FixtureRecord]) -> Result<usize, StoreError>;

    /// Every stored record recognised as test data
    fn find_test_records(&self) -> Result<Vec<FixtureRecord>, StoreError>;

    /// Number of stored records, test data or not
    fn count(&self) -> Result<usize, StoreError>;
}
