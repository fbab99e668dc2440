//! Transfers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, QueryParams};

/// Page size used when listing transfers without an explicit limit
const DEFAULT_TRANSFER_LIMIT: u32 = 100;

/// Timestamp format the transfers endpoint expects for date filters
const TRANSFER_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransferDetails {
    pub reference: Option<String>,
}

/// A transfer as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transfer {
    pub id: i64,
    pub user: Option<i64>,
    pub target_account: i64,
    pub source_account: Option<i64>,
    pub quote_uuid: String,
    pub status: String,
    pub reference: Option<String>,
    pub rate: f64,
    pub created: String,
    pub business: Option<i64>,
    pub details: TransferDetails,
    pub has_active_issues: bool,
    pub source_currency: String,
    pub source_value: f64,
    pub target_currency: String,
    pub target_value: f64,
    pub customer_transaction_id: String,
    pub payin_session_id: Option<String>,
}

impl Transfer {
    /// Payment reference, from the top-level field or the details block
    pub fn reference_text(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .or(self.details.reference.as_deref())
            .filter(|r| !r.is_empty())
    }

    /// Calendar date part of the creation timestamp
    pub fn created_date(&self) -> &str {
        self.created.get(..10).unwrap_or(self.created.as_str())
    }
}

/// Filters for listing transfers
#[derive(Debug, Clone, Default)]
pub struct ListTransfersRequest {
    pub profile_id: Option<i64>,
    pub status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListTransfersRequest {
    pub fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query
            .set_opt("profile", self.profile_id)
            .set_opt("status", self.status.as_deref().filter(|s| !s.is_empty()))
            .set_opt(
                "createdDateStart",
                self.since.map(|t| t.format(TRANSFER_DATE_FORMAT)),
            )
            .set_opt(
                "createdDateEnd",
                self.until.map(|t| t.format(TRANSFER_DATE_FORMAT)),
            )
            .set(
                "limit",
                self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_TRANSFER_LIMIT),
            )
            .set_opt("offset", self.offset.filter(|o| *o > 0));
        query
    }
}

/// Parameters for creating a transfer from a quote
#[derive(Debug, Clone, Default)]
pub struct NewTransferRequest {
    pub target_account: i64,
    pub quote_uuid: String,
    /// Idempotency token for the transfer
    pub customer_transaction_id: String,
    pub reference: Option<String>,
    pub source_account: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewTransferBody<'a> {
    target_account: i64,
    quote_uuid: &'a str,
    customer_transaction_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_account: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<TransferDetails>,
}

impl<'a> From<&'a NewTransferRequest> for NewTransferBody<'a> {
    fn from(req: &'a NewTransferRequest) -> Self {
        Self {
            target_account: req.target_account,
            quote_uuid: &req.quote_uuid,
            customer_transaction_id: &req.customer_transaction_id,
            source_account: req.source_account,
            details: req.reference.as_ref().map(|reference| TransferDetails {
                reference: Some(reference.clone()),
            }),
        }
    }
}

impl ApiClient {
    /// Lists transfers matching `req`
    pub async fn list_transfers(
        &self,
        req: &ListTransfersRequest,
    ) -> Result<Vec<Transfer>, ApiError> {
        self.get_cached("transfers", "/v1/transfers", &req.query())
            .await
    }

    /// Creates a transfer
    ///
    /// The request is submitted even if a transfer was already created under
    /// the same customer transaction id; the API deduplicates on that id.
    pub async fn create_transfer(&self, req: &NewTransferRequest) -> Result<Transfer, ApiError> {
        self.post_json("/v1/transfers", &NewTransferBody::from(req))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use chrono::TimeZone;
    use serde_json::json;

    fn test_client() -> ApiClient {
        ApiClient::new("https://api.example.com", "t", ResponseCache::with_dir("/tmp".into()))
    }

    #[test]
    fn test_list_query_defaults_limit() {
        let client = test_client();

        let url = client
            .url("/v1/transfers", &ListTransfersRequest::default().query())
            .unwrap();

        assert_eq!(url.query(), Some("limit=100"));
    }

    #[test]
    fn test_list_query_formats_dates() {
        let req = ListTransfersRequest {
            profile_id: Some(42),
            status: Some("outgoing_payment_sent".to_string()),
            since: Some(Utc.with_ymd_and_hms(2026, 9, 16, 8, 0, 0).unwrap()),
            until: Some(Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap()),
            limit: Some(50),
            offset: Some(0),
        };
        let client = test_client();

        let url = client.url("/v1/transfers", &req.query()).unwrap();

        assert_eq!(
            url.query(),
            Some(
                "createdDateEnd=2026-10-16T08%3A00%3A00Z&createdDateStart=2026-09-16T08%3A00%3A00Z\
                 &limit=50&profile=42&status=outgoing_payment_sent"
            )
        );
    }

    #[test]
    fn test_new_transfer_body_with_reference() {
        let req = NewTransferRequest {
            target_account: 13967081,
            quote_uuid: "q-1".to_string(),
            customer_transaction_id: "tok-1".to_string(),
            reference: Some("rent".to_string()),
            source_account: None,
        };

        assert_eq!(
            serde_json::to_value(NewTransferBody::from(&req)).unwrap(),
            json!({
                "targetAccount": 13967081,
                "quoteUuid": "q-1",
                "customerTransactionId": "tok-1",
                "details": {"reference": "rent"}
            })
        );
    }

    #[test]
    fn test_transfer_reference_and_date() {
        let json = r#"{"id": 1, "targetAccount": 2, "status": "processing",
            "created": "2026-10-16 09:12:44", "reference": null,
            "details": {"reference": "invoice 7"}, "sourceValue": 10, "targetValue": 11.5}"#;

        let transfer: Transfer = serde_json::from_str(json).unwrap();

        assert_eq!(transfer.reference_text(), Some("invoice 7"));
        assert_eq!(transfer.created_date(), "2026-10-16");
    }

    #[test]
    fn test_created_date_short_string() {
        let transfer = Transfer {
            created: "2026".to_string(),
            ..Default::default()
        };
        assert_eq!(transfer.created_date(), "2026");
    }
}
