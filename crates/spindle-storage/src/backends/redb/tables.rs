//! Physical table layout for the Redb backend.
//!
//! Redb table definitions are static, so every logical table lives in the
//! single [`DATA_TABLE`] and its keys are prefixed with the table name:
//!
//! ```text
//! <table name bytes> 0x00 <key bytes>
//! ```
//!
//! Table names therefore must not contain `0x00`.

use redb::TableDefinition;

/// The physical table that stores all key-value pairs.
pub const DATA_TABLE: TableDefinition<'static, &[u8], &[u8]> = TableDefinition::new("spindle_data");

/// Separator byte between table name and key.
pub const KEY_SEPARATOR: u8 = 0x00;

/// Encode a logical table name and key into a physical key.
pub fn encode_key(table: &str, key: &[u8]) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(table.len() + 1 + key.len());
    encoded.extend_from_slice(table.as_bytes());
    encoded.push(KEY_SEPARATOR);
    encoded.extend_from_slice(key);
    encoded
}

/// Split a physical key into its logical table name and key.
///
/// Returns `None` if the separator is missing or the name is not UTF-8.
pub fn decode_key(encoded: &[u8]) -> Option<(&str, &[u8])> {
    let sep = encoded.iter().position(|&b| b == KEY_SEPARATOR)?;
    let table = std::str::from_utf8(&encoded[..sep]).ok()?;
    Some((table, &encoded[sep + 1..]))
}

/// First physical key of a logical table.
pub fn table_start_key(table: &str) -> Vec<u8> {
    encode_key(table, &[])
}

/// First physical key past a logical table.
pub fn table_end_key(table: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(table.len() + 1);
    key.extend_from_slice(table.as_bytes());
    key.push(KEY_SEPARATOR + 1);
    key
}
