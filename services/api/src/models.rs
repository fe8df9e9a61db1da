//! API models for request and response payloads

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod agent;
pub mod sale_request;
pub mod shop;

/// Body of `POST /agent/sale-request`
///
/// Kept as raw JSON so a number or any other non-tier value is refused by the
/// workflow with a 400 instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequestPayload {
    #[serde(default)]
    pub sale_amount: Option<Value>,
}

impl CreateSaleRequestPayload {
    /// The tier tag, when it was sent as a string
    pub fn sale_amount(&self) -> Option<&str> {
        self.sale_amount.as_ref().and_then(Value::as_str)
    }
}

/// Body of `POST /shop/redeem`
#[derive(Debug, Deserialize)]
pub struct RedeemPayload {
    #[serde(default)]
    pub prize_id: Option<Value>,
}

impl RedeemPayload {
    /// `None` for a missing or null id; anything but a string is refused
    pub fn prize_id(&self) -> ApiResult<Option<&str>> {
        match &self.prize_id {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(id)) => Ok(Some(id)),
            Some(_) => Err(ApiError::BadRequest(
                "prize_id must be a string".to_string(),
            )),
        }
    }
}

/// Body of `POST /super-admin/prizes`
#[derive(Debug, Deserialize)]
pub struct CreatePrizePayload {
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub coin_cost: Option<Decimal>,
    #[serde(default)]
    pub is_limited: bool,
    pub quantity_available: Option<i32>,
}

/// Body of `PUT /super-admin/prizes/:id`, every field optional
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePrizePayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub coin_cost: Option<Decimal>,
    pub is_limited: Option<bool>,
    /// `null` clears the quantity, an absent key leaves it unchanged
    #[serde(default, deserialize_with = "present_or_null")]
    pub quantity_available: Option<Option<i32>>,
    pub is_active: Option<bool>,
}

/// Distinguish `"key": null` from a missing key
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_string_sale_amounts_carry_no_tier() {
        let number: CreateSaleRequestPayload =
            serde_json::from_str(r#"{"sale_amount": 100}"#).unwrap();
        assert_eq!(number.sale_amount(), None);

        let text: CreateSaleRequestPayload =
            serde_json::from_str(r#"{"sale_amount": "250"}"#).unwrap();
        assert_eq!(text.sale_amount(), Some("250"));
    }

    #[test]
    fn prize_id_must_be_text() {
        let number: RedeemPayload = serde_json::from_str(r#"{"prize_id": 5}"#).unwrap();
        assert!(matches!(number.prize_id(), Err(ApiError::BadRequest(_))));

        let missing: RedeemPayload = serde_json::from_str("{}").unwrap();
        assert!(matches!(missing.prize_id(), Ok(None)));
    }

    #[test]
    fn update_payload_tells_null_from_absent() {
        let absent: UpdatePrizePayload = serde_json::from_str(r#"{"name": "Mug"}"#).unwrap();
        assert_eq!(absent.quantity_available, None);

        let cleared: UpdatePrizePayload =
            serde_json::from_str(r#"{"quantity_available": null}"#).unwrap();
        assert_eq!(cleared.quantity_available, Some(None));

        let set: UpdatePrizePayload = serde_json::from_str(r#"{"quantity_available": 4}"#).unwrap();
        assert_eq!(set.quantity_available, Some(Some(4)));
    }
}
