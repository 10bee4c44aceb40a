//! # Core Feed Entities
//!
//! Defines the identifiers that travel with every subscription and update.
//!
//! ## Clusters
//!
//! - **Items**: `ItemName` (validated `item1`..`item30`)
//! - **Subscriptions**: `SubscriptionId` (adapter-assigned, value-compared)
//! - **Producer runs**: `ProducerEpoch`
//! - **Payloads**: `FieldMap`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ItemError;

/// Ordered map from field name to its string value.
pub type FieldMap = BTreeMap<String, String>;

/// Fixed prefix of every valid item name.
pub const ITEM_PREFIX: &str = "item";

/// Lowest admitted item id.
pub const MIN_ITEM_ID: u32 = 1;

/// Highest admitted item id.
pub const MAX_ITEM_ID: u32 = 30;

/// A validated item identifier (`item1` .. `item30`).
///
/// The original spelling is preserved, so `item05` stays `item05` on the
/// wire even though it denotes item 5.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Validates `name` against the fixed prefix and numeric range.
    ///
    /// The suffix is read as a decimal integer and the name is stored in its
    /// canonical form, so `item05` and `item5` are the same item.
    ///
    /// # Errors
    ///
    /// - `ItemError::MissingPrefix` - name does not start with `item`
    /// - `ItemError::NonNumeric` - suffix is not a decimal integer
    /// - `ItemError::OutOfRange` - integer outside `[1, 30]`
    pub fn parse(name: &str) -> Result<Self, ItemError> {
        let Some(suffix) = name.strip_prefix(ITEM_PREFIX) else {
            return Err(ItemError::MissingPrefix {
                name: name.to_string(),
                prefix: ITEM_PREFIX,
            });
        };

        let id: u32 = suffix.parse().map_err(|_| ItemError::NonNumeric {
            name: name.to_string(),
        })?;

        if !(MIN_ITEM_ID..=MAX_ITEM_ID).contains(&id) {
            return Err(ItemError::OutOfRange {
                name: name.to_string(),
                id,
                min: MIN_ITEM_ID,
                max: MAX_ITEM_ID,
            });
        }

        Ok(Self(format!("{ITEM_PREFIX}{id}")))
    }

    /// Builds the canonical name for a numeric id.
    ///
    /// # Errors
    ///
    /// `ItemError::OutOfRange` if `id` is outside `[1, 30]`.
    pub fn from_id(id: u32) -> Result<Self, ItemError> {
        Self::parse(&format!("{ITEM_PREFIX}{id}"))
    }

    /// The numeric part of the name.
    #[must_use]
    pub fn id(&self) -> u32 {
        // Validated at construction.
        self.0[ITEM_PREFIX.len()..].parse().unwrap_or(0)
    }

    /// The name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All admitted item names, in id order.
    pub fn all() -> impl Iterator<Item = ItemName> {
        (MIN_ITEM_ID..=MAX_ITEM_ID).map(|id| Self(format!("{ITEM_PREFIX}{id}")))
    }
}

impl fmt::Display for ItemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ItemName {
    type Err = ItemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ItemName {
    type Error = ItemError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemName> for String {
    fn from(item: ItemName) -> Self {
        item.0
    }
}

/// Identifier the adapter assigns to one subscription.
///
/// Sent to the generator inside control requests and echoed back on every
/// update, so the adapter can tell updates of a superseded subscription
/// from those of the running one. Always compared by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SubscriptionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

/// Token identifying one continuous run of the generator process.
///
/// A different epoch on an inbound message means the generator restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProducerEpoch(pub u32);

impl fmt::Display for ProducerEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_items() {
        for id in MIN_ITEM_ID..=MAX_ITEM_ID {
            let item = ItemName::parse(&format!("item{id}")).unwrap();
            assert_eq!(item.id(), id);
        }
    }

    #[test]
    fn test_non_canonical_spelling_is_normalized() {
        for spelling in ["item05", "item+5", "item005"] {
            let item = ItemName::parse(spelling).unwrap();
            assert_eq!(item.id(), 5);
            assert_eq!(item.as_str(), "item5");
            assert_eq!(item, ItemName::from_id(5).unwrap());
        }
        assert!(ItemName::all().any(|known| known == ItemName::parse("item05").unwrap()));
    }

    #[test]
    fn test_invalid_items() {
        assert!(matches!(
            ItemName::parse("stock5"),
            Err(ItemError::MissingPrefix { .. })
        ));
        assert!(matches!(
            ItemName::parse("itemX"),
            Err(ItemError::NonNumeric { .. })
        ));
        assert!(matches!(
            ItemName::parse("item"),
            Err(ItemError::NonNumeric { .. })
        ));
        assert!(matches!(
            ItemName::parse("item0"),
            Err(ItemError::OutOfRange { id: 0, .. })
        ));
        assert!(matches!(
            ItemName::parse("item31"),
            Err(ItemError::OutOfRange { id: 31, .. })
        ));
        assert!(matches!(
            ItemName::parse("item-3"),
            Err(ItemError::NonNumeric { .. })
        ));
    }

    #[test]
    fn test_all_items() {
        let all: Vec<_> = ItemName::all().collect();
        assert_eq!(all.len(), 30);
        assert_eq!(all[0].as_str(), "item1");
        assert_eq!(all[29].as_str(), "item30");
    }

    #[test]
    fn test_item_serde_validates() {
        let ok: ItemName = serde_json::from_str("\"item7\"").unwrap();
        assert_eq!(ok.id(), 7);
        assert!(serde_json::from_str::<ItemName>("\"item99\"").is_err());
    }

    #[test]
    fn test_subscription_id_value_equality() {
        let a: SubscriptionId = "42".parse().unwrap();
        let b = SubscriptionId(42);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "42");
    }
}
