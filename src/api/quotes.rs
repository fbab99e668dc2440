//! Exchange quotes

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fee {
    pub transferwise: f64,
    pub pay_in: f64,
    pub discount: f64,
    pub partner: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisabledReason {
    pub code: String,
    pub message: String,
}

/// One way of paying in and out for a quote, with its fees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentOption {
    pub pay_in: String,
    pub pay_out: String,
    pub source_amount: f64,
    pub target_amount: f64,
    pub fee: Fee,
    pub formatted_estimated_delivery: Option<String>,
    pub disabled: bool,
    pub disabled_reason: Option<DisabledReason>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Notice {
    pub text: String,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub notice_type: String,
}

/// An authenticated exchange quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Quote {
    pub id: String,
    pub source_amount: f64,
    pub source_currency: String,
    pub target_amount: f64,
    pub target_currency: String,
    pub rate: f64,
    pub created_time: String,
    pub rate_expiration_time: String,
    pub rate_type: String,
    pub status: String,
    pub expiration_time: String,
    pub payment_options: Vec<PaymentOption>,
    pub notices: Vec<Notice>,
}

/// Parameters for creating a quote; exactly one amount should be set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuoteRequest {
    #[serde(skip)]
    pub profile_id: i64,
    pub source_currency: String,
    pub target_currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<f64>,
}

impl ApiClient {
    /// Creates an authenticated quote for a currency conversion
    pub async fn create_quote(&self, req: &NewQuoteRequest) -> Result<Quote, ApiError> {
        let path = format!("/v3/profiles/{}/quotes", req.profile_id);
        self.post_json(&path, req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_quote_body_omits_profile_and_missing_amount() {
        let req = NewQuoteRequest {
            profile_id: 42,
            source_currency: "GBP".to_string(),
            target_currency: "EUR".to_string(),
            source_amount: None,
            target_amount: Some(120.0),
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"sourceCurrency": "GBP", "targetCurrency": "EUR", "targetAmount": 120.0})
        );
    }

    #[test]
    fn test_quote_deserializes_with_options_and_notices() {
        let json = r#"{
            "id": "11144c35-9fe8-4c32-b7fd-d05c2a7734bf",
            "sourceCurrency": "GBP", "targetCurrency": "USD",
            "sourceAmount": 100, "targetAmount": 129.24, "rate": 1.30445,
            "rateType": "FIXED", "payOut": "BANK_TRANSFER", "status": "PENDING",
            "createdTime": "2026-10-16T10:00:00Z",
            "paymentOptions": [
                {"payIn": "BANK_TRANSFER", "payOut": "BANK_TRANSFER", "sourceAmount": 100,
                 "targetAmount": 129.24, "fee": {"transferwise": 0.92, "total": 0.92},
                 "formattedEstimatedDelivery": "by Friday", "disabled": false},
                {"payIn": "CARD", "payOut": "BANK_TRANSFER", "disabled": true,
                 "disabledReason": {"code": "error.payInmethod.disabled",
                                    "message": "Not available"}}
            ],
            "notices": [{"text": "Weekend delays", "link": null, "type": "WARNING"}]
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();

        assert_eq!(quote.payment_options.len(), 2);
        assert!((quote.payment_options[0].fee.total - 0.92).abs() < 1e-9);
        assert!(quote.payment_options[1].disabled);
        assert_eq!(quote.notices[0].notice_type, "WARNING");
    }
}
