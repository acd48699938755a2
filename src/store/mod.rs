//! Append-only record store with a navigation cursor.
//!
//! The store only ever grows, in generation order, so its contents are
//! always a prefix of the full dataset. The cursor clamps at both ends:
//! stepping past the last generated record stays on it, which is what
//! lets the loader notice a viewer waiting at the frontier.
//!
//! Per-diagnosis counts are kept as records arrive, so reading the
//! dataset's category mix never rescans it.

use crate::analysis::CategoryDistribution;
use crate::synthesis::Record;
use thiserror::Error;

/// Errors from index-based store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("index {index} out of range for store of {len} records")]
    OutOfRange { index: usize, len: usize },
}

/// Ordered, append-only sequence of records plus a cursor.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    cursor: usize,
    distribution: CategoryDistribution,
}

impl RecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Appends a record. Stored records are never modified.
    pub fn append(&mut self, record: Record) {
        self.distribution.add(record.diagnosis());
        self.records.push(record);
    }

    /// Returns the record at `index`.
    pub fn get(&self, index: usize) -> Result<&Record, StoreError> {
        self.records.get(index).ok_or(StoreError::OutOfRange {
            index,
            len: self.records.len(),
        })
    }

    /// Returns the number of stored records.
    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been stored yet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the cursor position.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves the cursor by `delta`, clamped to `[0, len - 1]`.
    ///
    /// Fails only when the store is empty.
    pub fn move_cursor(&mut self, delta: isize) -> Result<usize, StoreError> {
        let last = self.last_index()?;
        let target = if delta.is_negative() {
            self.cursor.saturating_sub(delta.unsigned_abs())
        } else {
            self.cursor.saturating_add(delta as usize)
        };
        self.cursor = target.min(last);
        Ok(self.cursor)
    }

    /// Moves the cursor to an exact index.
    pub fn select(&mut self, index: usize) -> Result<usize, StoreError> {
        self.get(index)?;
        self.cursor = index;
        Ok(index)
    }

    /// Returns the record under the cursor.
    pub fn current(&self) -> Result<&Record, StoreError> {
        self.get(self.cursor)
    }

    /// Iterates over stored records in generation order.
    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Returns all stored records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Per-diagnosis counts of the stored records.
    pub fn distribution(&self) -> &CategoryDistribution {
        &self.distribution
    }

    fn last_index(&self) -> Result<usize, StoreError> {
        self.records
            .len()
            .checked_sub(1)
            .ok_or(StoreError::OutOfRange { index: 0, len: 0 })
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthesis::{Diagnosis, Quality};
    use chrono::NaiveDate;

    fn make_record(index: u64) -> Record {
        make_diagnosed(index, Diagnosis::Normal)
    }

    fn make_diagnosed(index: u64, diagnosis: Diagnosis) -> Record {
        let timestamp = NaiveDate::from_ymd_opt(2025, 1, 6)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        Record::new(
            index,
            vec![index as f32; 4],
            60 + index as u32,
            diagnosis,
            timestamp,
            Quality::Good,
        )
    }

    fn filled(n: u64) -> RecordStore {
        let mut store = RecordStore::new();
        for i in 0..n {
            store.append(make_record(i));
        }
        store
    }

    #[test]
    fn test_append_is_monotonic() {
        let mut store = RecordStore::new();
        let mut expected = Vec::new();
        for i in 0..25 {
            let record = make_record(i);
            expected.push(record.clone());
            store.append(record);
            assert_eq!(store.len(), i as usize + 1);
        }
        for (i, record) in expected.iter().enumerate() {
            assert_eq!(store.get(i).unwrap(), record);
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let store = filled(3);
        assert_eq!(
            store.get(3),
            Err(StoreError::OutOfRange { index: 3, len: 3 })
        );
    }

    #[test]
    fn test_empty_store_has_no_current() {
        let mut store = RecordStore::new();
        assert!(store.current().is_err());
        assert!(store.move_cursor(1).is_err());
    }

    #[test]
    fn test_cursor_clamps() {
        let mut store = filled(3);
        assert_eq!(store.move_cursor(-1).unwrap(), 0);
        assert_eq!(store.move_cursor(1).unwrap(), 1);
        assert_eq!(store.move_cursor(1).unwrap(), 2);
        assert_eq!(store.move_cursor(1).unwrap(), 2);
        assert_eq!(store.move_cursor(isize::MAX).unwrap(), 2);
        assert_eq!(store.move_cursor(isize::MIN).unwrap(), 0);
        assert_eq!(store.current().unwrap().index(), 0);
    }

    #[test]
    fn test_cursor_follows_growth() {
        let mut store = filled(2);
        assert_eq!(store.move_cursor(5).unwrap(), 1);

        store.append(make_record(2));
        assert_eq!(store.move_cursor(1).unwrap(), 2);
        assert_eq!(store.current().unwrap().index(), 2);
    }

    #[test]
    fn test_select() {
        let mut store = filled(5);
        assert_eq!(store.select(4).unwrap(), 4);
        assert!(store.select(5).is_err());
        // Failed select leaves the cursor alone
        assert_eq!(store.cursor(), 4);
    }

    #[test]
    fn test_distribution_tracks_appends() {
        let diagnoses = [
            Diagnosis::Normal,
            Diagnosis::Arrhythmia,
            Diagnosis::Normal,
            Diagnosis::Tachycardia,
            Diagnosis::Bradycardia,
            Diagnosis::Normal,
        ];
        let mut store = RecordStore::with_capacity(diagnoses.len());
        assert_eq!(store.distribution().total(), 0);

        for (i, diagnosis) in diagnoses.into_iter().enumerate() {
            store.append(make_diagnosed(i as u64, diagnosis));
            assert_eq!(store.distribution().total(), store.len());
        }

        assert_eq!(store.distribution().count(Diagnosis::Normal), 3);
        assert_eq!(store.distribution().count(Diagnosis::Arrhythmia), 1);
        assert_eq!(
            store.distribution(),
            &CategoryDistribution::from_records(&store)
        );
    }
}
