//! Locally synthesized updates sent while the feed is unavailable.

use shared_types::FieldMap;

/// Field carrying the feed status of an item.
pub const ITEM_STATUS_FIELD: &str = "item_status";

/// Value of `item_status` while no producer data is available.
pub const INACTIVE: &str = "inactive";

/// Every numeric field of a quote, zeroed in the inactive snapshot.
pub const NUMERIC_FIELDS: [&str; 11] = [
    "time",
    "last_price",
    "ask",
    "bid",
    "bid_quantity",
    "ask_quantity",
    "pct_change",
    "min",
    "max",
    "ref_price",
    "open_price",
];

/// Full snapshot of an item whose producer is unavailable.
#[must_use]
pub fn inactive_snapshot() -> FieldMap {
    let mut fields: FieldMap = NUMERIC_FIELDS
        .iter()
        .map(|name| ((*name).to_string(), "0".to_string()))
        .collect();
    fields.insert("stock_name".to_string(), "-".to_string());
    fields.insert(ITEM_STATUS_FIELD.to_string(), INACTIVE.to_string());
    fields
}

/// Delta flipping an already snapshotted item to inactive.
#[must_use]
pub fn inactive_delta() -> FieldMap {
    FieldMap::from([(ITEM_STATUS_FIELD.to_string(), INACTIVE.to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_contents() {
        let snapshot = inactive_snapshot();
        assert_eq!(snapshot.len(), 13);
        assert_eq!(snapshot["stock_name"], "-");
        assert_eq!(snapshot["item_status"], "inactive");
        for field in NUMERIC_FIELDS {
            assert_eq!(snapshot[field], "0", "{field}");
        }
    }

    #[test]
    fn test_delta_contents() {
        let delta = inactive_delta();
        assert_eq!(delta.len(), 1);
        assert_eq!(delta["item_status"], "inactive");
    }
}
