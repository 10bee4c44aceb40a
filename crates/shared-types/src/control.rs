//! # Control Requests
//!
//! Text commands the adapter sends to the generator over the request queue.
//!
//! ```text
//! reset
//! subscribe<item>_<subscription id>      e.g. subscribeitem5_12
//! unsubscribe<item>_<subscription id>    e.g. unsubscribeitem5_12
//! ```
//!
//! There is no delimiter between the command and the item name; a single
//! `_` separates the item from the subscription id and the parser splits on
//! the first one.

use std::fmt;
use std::str::FromStr;

use crate::entities::{ItemName, SubscriptionId};
use crate::errors::ControlParseError;

const RESET: &str = "reset";
const SUBSCRIBE: &str = "subscribe";
const UNSUBSCRIBE: &str = "unsubscribe";

/// A pending request for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlRequest {
    /// Drop every subscription the generator holds.
    Reset,
    /// Start forwarding updates for `item`, tagged with `id`.
    Subscribe { item: ItemName, id: SubscriptionId },
    /// Stop forwarding updates for `item` if still tagged with `id`.
    Unsubscribe { item: ItemName, id: SubscriptionId },
}

impl ControlRequest {
    /// The item this request refers to, if any.
    #[must_use]
    pub fn item(&self) -> Option<&ItemName> {
        match self {
            Self::Reset => None,
            Self::Subscribe { item, .. } | Self::Unsubscribe { item, .. } => Some(item),
        }
    }
}

impl fmt::Display for ControlRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reset => f.write_str(RESET),
            Self::Subscribe { item, id } => write!(f, "{SUBSCRIBE}{item}_{id}"),
            Self::Unsubscribe { item, id } => write!(f, "{UNSUBSCRIBE}{item}_{id}"),
        }
    }
}

impl FromStr for ControlRequest {
    type Err = ControlParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if text == RESET {
            return Ok(Self::Reset);
        }

        // "unsubscribe" does not start with "subscribe", so order is irrelevant.
        if let Some(rest) = text.strip_prefix(SUBSCRIBE) {
            let (item, id) = split_item_and_id(text, rest)?;
            return Ok(Self::Subscribe { item, id });
        }
        if let Some(rest) = text.strip_prefix(UNSUBSCRIBE) {
            let (item, id) = split_item_and_id(text, rest)?;
            return Ok(Self::Unsubscribe { item, id });
        }

        Err(ControlParseError::UnknownCommand(text.to_string()))
    }
}

fn split_item_and_id(
    text: &str,
    rest: &str,
) -> Result<(ItemName, SubscriptionId), ControlParseError> {
    let (item, id) = rest
        .split_once('_')
        .ok_or_else(|| ControlParseError::MissingSeparator(text.to_string()))?;

    let id = id
        .parse::<SubscriptionId>()
        .map_err(|_| ControlParseError::InvalidSubscriptionId {
            text: text.to_string(),
        })?;

    Ok((ItemName::parse(item)?, id))
}
