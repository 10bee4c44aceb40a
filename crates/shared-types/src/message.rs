//! # Bus Messages
//!
//! Structured payloads published by the generator on the update topic.
//!
//! Every message carries the generator's `ProducerEpoch`, so a plain field
//! update doubles as a heartbeat for the adapter's liveness detector.

use serde::{Deserialize, Serialize};

use crate::entities::{FieldMap, ItemName, ProducerEpoch, SubscriptionId};
use crate::errors::WireError;

/// A field update for one subscribed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedMessage {
    /// The item the values belong to.
    pub item: ItemName,
    /// Complete set of current field values.
    pub fields: FieldMap,
    /// Whether the generator considers this the item's snapshot.
    pub is_snapshot: bool,
    /// Subscription the update was produced for.
    pub subscription_id: SubscriptionId,
    /// Run of the generator that produced the update.
    pub epoch: ProducerEpoch,
}

/// Anything the generator publishes on the update topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BusMessage {
    /// Liveness signal with no payload.
    Heartbeat { epoch: ProducerEpoch },
    /// Field update for a subscription.
    Update(FeedMessage),
}

impl BusMessage {
    /// The producer epoch every message carries.
    #[must_use]
    pub fn epoch(&self) -> ProducerEpoch {
        match self {
            Self::Heartbeat { epoch } => *epoch,
            Self::Update(update) => update.epoch,
        }
    }

    /// Decodes a payload received from the update topic.
    ///
    /// # Errors
    ///
    /// `WireError::Json` if the bytes are not a valid `BusMessage`.
    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        Ok(serde_json::from_slice(payload)?)
    }

    /// Encodes the message into `buffer`, appending to its current contents.
    ///
    /// # Errors
    ///
    /// `WireError::Json` if serialization fails.
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), WireError> {
        serde_json::to_writer(buffer, self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_update() -> BusMessage {
        let mut fields = FieldMap::new();
        fields.insert("last_price".to_string(), "12.5".to_string());
        BusMessage::Update(FeedMessage {
            item: ItemName::parse("item5").unwrap(),
            fields,
            is_snapshot: true,
            subscription_id: SubscriptionId(3),
            epoch: ProducerEpoch(77),
        })
    }

    #[test]
    fn test_epoch_accessor() {
        assert_eq!(
            BusMessage::Heartbeat {
                epoch: ProducerEpoch(9)
            }
            .epoch(),
            ProducerEpoch(9)
        );
        assert_eq!(sample_update().epoch(), ProducerEpoch(77));
    }

    #[test]
    fn test_encode_decode_update() {
        let message = sample_update();
        let mut buffer = Vec::new();
        message.encode_into(&mut buffer).unwrap();
        assert_eq!(BusMessage::decode(&buffer).unwrap(), message);
    }

    #[test]
    fn test_heartbeat_wire_shape() {
        let mut buffer = Vec::new();
        BusMessage::Heartbeat {
            epoch: ProducerEpoch(42),
        }
        .encode_into(&mut buffer)
        .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(text, r#"{"type":"heartbeat","epoch":42}"#);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            BusMessage::decode(b"not json"),
            Err(WireError::Json(_))
        ));
        // Item outside the admitted range is rejected during decoding.
        let bad = br#"{"type":"update","item":"item99","fields":{},"is_snapshot":false,"subscription_id":1,"epoch":1}"#;
        assert!(BusMessage::decode(bad).is_err());
    }
}
