//! Public API surface for the gateway.
//!
//! This file consolidates the response payloads returned by the HTTP API.
//! Field names are the wire names consumed by the frontend, so renames here
//! are breaking changes.

use serde::{Deserialize, Serialize};

/// Item identifier (primary key in the metadata store).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn new(value: i64) -> Self {
        ItemId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(value: i64) -> Self {
        ItemId(value)
    }
}

/// Stored dimensions of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeInfo {
    pub id: ItemId,
    pub width: i32,
    pub height: i32,
}

/// Low resolution preview of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewInfo {
    pub id: ItemId,
    pub width: i32,
    pub height: i32,
    /// Base64 encoded pixel data
    pub pixels: String,
}

/// Aggregated metadata for a set of items (`GET /items`).
///
/// Each facet is filled by its own query; an item missing from every facet
/// simply leaves the sequences empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemsResponse {
    /// Seconds spent validating and querying
    pub duration: f64,
    pub reposts: Vec<ItemId>,
    pub sizes: Vec<SizeInfo>,
    pub previews: Vec<PreviewInfo>,
}

/// One `(timestamp, score)` sample of a user's score history.
pub type ScorePoint = (i64, i32);

/// Score history of a single user (`GET /user/{user}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(
        rename = "benisHistory",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub benis_history: Vec<ScorePoint>,
}

/// Username completions (`GET /user/suggest/{prefix}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSuggestResponse {
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_id_serializes_as_number() {
        let value = serde_json::to_value(ItemId::new(42)).unwrap();
        assert_eq!(value, json!(42));
    }

    #[test]
    fn test_items_response_wire_shape() {
        let response = ItemsResponse {
            duration: 0.5,
            reposts: vec![ItemId::new(1)],
            sizes: vec![SizeInfo {
                id: ItemId::new(2),
                width: 100,
                height: 200,
            }],
            previews: vec![],
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "duration": 0.5,
                "reposts": [1],
                "sizes": [{"id": 2, "width": 100, "height": 200}],
                "previews": [],
            })
        );
    }

    #[test]
    fn test_user_response_omits_empty_history() {
        let value = serde_json::to_value(UserResponse::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_user_response_history_as_pairs() {
        let response = UserResponse {
            benis_history: vec![(1_700_000_000, 10), (1_700_000_600, 12)],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"benisHistory": [[1_700_000_000i64, 10], [1_700_000_600i64, 12]]})
        );
    }

    #[test]
    fn test_suggest_response_empty_names_is_array() {
        let value = serde_json::to_value(UserSuggestResponse::default()).unwrap();
        assert_eq!(value, json!({"names": []}));
    }
}
