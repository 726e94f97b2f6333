//! Lookup table for decoded Pin/Track records.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::types::DataRecord;

#[derive(Clone, Debug, Default)]
struct Slot {
    positions: SmallVec<[u32; 4]>,
    cursor: usize,
}

/// Decoded Pin or Track records, keyed by `(key, index)`.
///
/// Call ordinals reset every tick, so one `(key, index)` pair normally
/// appears once per tick that touched the key. Each pair keeps its own
/// forward-only cursor: the Nth lookup of a pair returns the Nth record
/// written for it.
///
/// # Examples
///
/// ```
/// use rewind_trace::{DataRecord, DataTable};
///
/// let mut table = DataTable::with_capacity(2);
/// table.push(DataRecord::new(5, 0, &[1]).unwrap());
/// table.push(DataRecord::new(5, 0, &[2]).unwrap());
///
/// assert_eq!(table.take(5, 0).unwrap().payload.as_slice(), &[1]);
/// assert_eq!(table.take(5, 0).unwrap().payload.as_slice(), &[2]);
/// assert!(table.take(5, 0).is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DataTable {
    records: Vec<DataRecord>,
    slots: IndexMap<(u32, u32), Slot>,
    consumed: usize,
}

impl DataTable {
    /// Create a table sized for exactly `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            slots: IndexMap::new(),
            consumed: 0,
        }
    }

    /// Append a record in file order.
    pub fn push(&mut self, record: DataRecord) {
        let position = self.records.len() as u32;
        self.slots
            .entry((record.key, record.index))
            .or_default()
            .positions
            .push(position);
        self.records.push(record);
    }

    /// Return the next unconsumed record for `(key, index)` and advance
    /// that pair's cursor.
    pub fn take(&mut self, key: u32, index: u32) -> Option<&DataRecord> {
        let slot = self.slots.get_mut(&(key, index))?;
        let position = *slot.positions.get(slot.cursor)?;
        slot.cursor += 1;
        self.consumed += 1;
        self.records.get(position as usize)
    }

    /// The record [`take`](Self::take) would return, without consuming it.
    pub fn peek(&self, key: u32, index: u32) -> Option<&DataRecord> {
        let slot = self.slots.get(&(key, index))?;
        let position = *slot.positions.get(slot.cursor)?;
        self.records.get(position as usize)
    }

    /// Number of records in the table.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records not yet returned by [`take`](Self::take).
    pub fn remaining(&self) -> usize {
        self.records.len() - self.consumed
    }

    /// Number of distinct `(key, index)` pairs.
    pub fn pair_count(&self) -> usize {
        self.slots.len()
    }

    /// Move every cursor back to the first record.
    pub fn rewind(&mut self) {
        for slot in self.slots.values_mut() {
            slot.cursor = 0;
        }
        self.consumed = 0;
    }

    /// All records in file order.
    pub fn iter(&self) -> impl Iterator<Item = &DataRecord> {
        self.records.iter()
    }
}
