//! `BTreeMap`-backed store.

use std::collections::btree_map;
use std::collections::BTreeMap;

use eyre::Result;

use super::{KeyValueStore, StoreCursor};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn search(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn insert(&mut self, key: &[u8], payload: &[u8]) -> Result<()> {
        self.entries.insert(key.to_vec(), payload.to_vec());
        Ok(())
    }

    fn first(&self) -> Result<Option<Box<dyn StoreCursor + '_>>> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(MemoryCursor {
            iter: self.entries.iter(),
        })))
    }
}

struct MemoryCursor<'a> {
    iter: btree_map::Iter<'a, Vec<u8>, Vec<u8>>,
}

impl StoreCursor for MemoryCursor<'_> {
    fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        Ok(self.iter.next().map(|(k, v)| (k.clone(), v.clone())))
    }
}
