use crate::error::PipelineError;
use crate::progress::ProgressLog;
use crate::record::{PairedRecord, Record};
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Field used to decide whether two reads are duplicates of each other.
#[derive(clap::ValueEnum, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DedupKey {
    /// the read identifier line
    Id,
    /// the raw nucleotide sequence (case-sensitive)
    #[default]
    Sequence,
}

/// Anything that can be filed in a [`SequenceStore`].
pub trait Keyed {
    fn key(&self, by: DedupKey) -> String;
}

impl Keyed for Record {
    fn key(&self, by: DedupKey) -> String {
        match by {
            DedupKey::Id => self.id().to_string(),
            DedupKey::Sequence => self.sequence().to_string(),
        }
    }
}

impl Keyed for PairedRecord {
    /// Pairs carry the key they were built with; `by` is ignored.
    fn key(&self, _by: DedupKey) -> String {
        self.pair_key().to_string()
    }
}

/// An ordered map from key to the most recently inserted value.
///
/// Inserting an existing key replaces the stored value, so after a full pass
/// over a file the store holds the *last* occurrence of every key. Iteration
/// is in ascending key order.
#[derive(Debug, Clone)]
pub struct SequenceStore<V> {
    map: BTreeMap<String, V>,
}

impl<V> Default for SequenceStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> SequenceStore<V> {
    pub fn new() -> Self {
        SequenceStore {
            map: BTreeMap::new(),
        }
    }

    /// Insert or replace. Returns the value that was displaced, if any.
    pub fn insert(&mut self, key: String, value: V) -> Option<V> {
        self.map.insert(key, value)
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn values(&self) -> btree_map::Values<'_, String, V> {
        self.map.values()
    }
}

impl<V: Keyed> SequenceStore<V> {
    /// Files `value` under its own key.
    pub fn insert_keyed(&mut self, value: V, by: DedupKey) -> Option<V> {
        let key = value.key(by);
        self.insert(key, value)
    }
}

impl<V> IntoIterator for SequenceStore<V> {
    type Item = (String, V);
    type IntoIter = btree_map::IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}

impl<V> FromIterator<(String, V)> for SequenceStore<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        SequenceStore {
            map: iter.into_iter().collect(),
        }
    }
}

/// Drains a record stream into a store keyed by `by`, advancing `progress`
/// once per record. Returns the store and the number of records read.
///
/// Stops at the first malformed record.
pub fn populate<V, I>(
    records: I,
    by: DedupKey,
    progress: &mut ProgressLog,
) -> Result<(SequenceStore<V>, usize), PipelineError>
where
    V: Keyed,
    I: IntoIterator<Item = Result<V, PipelineError>>,
{
    let mut store = SequenceStore::new();
    let mut read = 0;

    for rec in records {
        store.insert_keyed(rec?, by);
        read += 1;
        progress.increment(1);
    }

    Ok((store, read))
}
