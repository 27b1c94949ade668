//! Selectivity estimation by sampling the index key range.

use std::ops::Bound;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use spindle_core::encoding::keys::{decode_edge_index_key, edge_index_bounds};
use spindle_core::{DirectionValue, IndexId};
use spindle_storage::{Cursor, Transaction};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Ratio of distinct direction values to entries, with its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectivityEstimate {
    /// Value in `(0, 1]`. `1.0` means every entry has its own value.
    pub estimate: f64,
    /// When the estimate was measured; `None` for the configured default.
    pub computed_at: Option<SystemTime>,
}

impl SelectivityEstimate {
    /// An unmeasured estimate.
    #[must_use]
    pub const fn assumed(estimate: f64) -> Self {
        Self { estimate, computed_at: None }
    }

    /// A measured estimate taken now.
    #[must_use]
    pub fn measured(estimate: f64) -> Self {
        Self { estimate, computed_at: Some(SystemTime::now()) }
    }
}

/// Outcome of one sampling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectivitySample {
    /// Entries read.
    pub sampled: usize,
    /// Distinct direction values among them.
    pub distinct: usize,
}

impl SelectivitySample {
    /// Distinct values per entry; an empty sample counts as fully selective.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(self) -> f64 {
        if self.sampled == 0 {
            1.0
        } else {
            self.distinct as f64 / self.sampled as f64
        }
    }
}

/// Read up to `limit` entries of an index in key order and count distinct values.
///
/// Keys are sorted by direction value first, so equal values are adjacent.
pub fn sample_index<T: Transaction>(
    tx: &T,
    table: &str,
    index_id: IndexId,
    limit: usize,
) -> IndexResult<SelectivitySample> {
    let (start, end) = edge_index_bounds(index_id);
    let mut cursor = tx.range(table, borrowed_bound(&start), borrowed_bound(&end))?;

    let mut sample = SelectivitySample { sampled: 0, distinct: 0 };
    let mut previous: Option<DirectionValue> = None;
    while sample.sampled < limit {
        let Some((key, _)) = cursor.next()? else { break };
        let (value, _) = decode_edge_index_key(index_id, &key)
            .map_err(|e| IndexError::Corruption(format!("while sampling index {index_id}: {e}")))?;
        sample.sampled += 1;
        if previous.as_ref() != Some(&value) {
            sample.distinct += 1;
            previous = Some(value);
        }
    }

    debug!(index = %index_id, sampled = sample.sampled, distinct = sample.distinct, "sampled edge index");
    Ok(sample)
}

pub(crate) fn borrowed_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}
