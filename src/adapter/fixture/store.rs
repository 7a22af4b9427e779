use std::{
    collections::BTreeMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard}
};

use uuid::Uuid;

use crate::{
    domain::fixture::FixtureRecord,
    port::fixture::{FixtureStore, StoreError}
};

/// Process-local store, the default backing for the fixture commands
#[derive(Debug, Default)]
pub struct InMemoryFixtureStore {
    records: RwLock<BTreeMap<Uuid, FixtureRecord>>
}

impl InMemoryFixtureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = FixtureRecord>) -> Self {
        Self { records: RwLock::new(records.into_iter().map(|record| (record.id, record)).collect()) }
    }

    /// Every stored record in id order
    pub fn records(&self) -> Vec<FixtureRecord> {
        self.read().values().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Uuid, FixtureRecord>> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Uuid, FixtureRecord>> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FixtureStore for InMemoryFixtureStore {
    fn save_all(&self, records: Vec<FixtureRecord>) -> Result<Vec<FixtureRecord>, StoreError> {
        let mut stored = self.write();
        for record in &records {
            stored.insert(record.id, record.clone());
        }
        Ok(records)
    }

    fn delete_all(&self, records: &[FixtureRecord]) -> Result<usize, StoreError> {
        let mut stored = self.write();
        Ok(records.iter().filter(|record| stored.remove(&record.id).is_some()).count())
    }

    fn find_test_records(&self) -> Result<Vec<FixtureRecord>, StoreError> {
        Ok(self.read().values().filter(|record| record.is_test_record()).cloned().collect())
    }

    fn count(&self) -> Result<usize, StoreError> {
        Ok(self.read().len())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(number: &str) -> FixtureRecord {
        FixtureRecord::new(number, "INV1", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), "ISS", 2.0, 100.0, 10.0, true)
    }

    #[test]
    fn test_delete_counts_only_existing_records() {
        let kept = record("TEST000001");
        let store = InMemoryFixtureStore::with_records(vec![kept.clone()]);

        let removed = store.delete_all(&[kept.clone(), record("TEST000002")]).unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_find_test_records_skips_real_data() {
        let store = InMemoryFixtureStore::with_records(vec![record("TEST000001"), record("CR-2024-001")]);

        let found = store.find_test_records().unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].number, "TEST000001");
        assert_eq!(store.count().unwrap(), 2);
    }
}
