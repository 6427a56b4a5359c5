//! # Storage Collaborator
//!
//! The SQL core never owns a storage engine. Table and index data is reached
//! through [`KeyValueStore`], an ordered byte-key map with a forward cursor.
//! An embedding database supplies the real implementation (a B-tree over
//! pages, typically); [`MemoryStore`] covers tests and small embeddings.
//!
//! ## Key Layout
//!
//! ```text
//! table row:  [rowid: u64 big-endian, 8 bytes] -> record payload
//! index row:  [serialized column values]       -> payload
//! ```
//!
//! Big-endian rowids make byte order equal numeric order, so a cursor walks a
//! table in rowid order.

mod memory;

use eyre::{ensure, Result};

pub use memory::MemoryStore;

/// Width of a table row key.
pub const ROW_KEY_LEN: usize = 8;

pub trait KeyValueStore {
    fn search(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Inserts or replaces the payload stored under `key`.
    fn insert(&mut self, key: &[u8], payload: &[u8]) -> Result<()>;

    /// Cursor positioned before the smallest key, or `None` for an empty
    /// store.
    fn first(&self) -> Result<Option<Box<dyn StoreCursor + '_>>>;
}

pub trait StoreCursor {
    fn next(&mut self) -> Result<Option<(Vec<u8>, Vec<u8>)>>;
}

pub fn row_key(rowid: u64) -> [u8; ROW_KEY_LEN] {
    rowid.to_be_bytes()
}

pub fn decode_row_key(key: &[u8]) -> Result<u64> {
    ensure!(
        key.len() == ROW_KEY_LEN,
        "row key must be {} bytes, got {}",
        ROW_KEY_LEN,
        key.len()
    );
    let mut bytes = [0u8; ROW_KEY_LEN];
    bytes.copy_from_slice(key);
    Ok(u64::from_be_bytes(bytes))
}
