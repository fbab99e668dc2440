//! Recipient accounts

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ApiClient, ApiError, QueryParams};

/// Fields tried, in order, when showing a recipient's account number
const ACCOUNT_NUMBER_FIELDS: [&str; 6] =
    ["iban", "accountNumber", "number", "accountId", "id", "bic"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipientName {
    pub full_name: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub middle_name: Option<String>,
}

/// A recipient account payments can be sent to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Recipient {
    pub id: i64,
    pub creator_id: Option<i64>,
    pub profile_id: Option<i64>,
    pub name: RecipientName,
    pub currency: String,
    pub country: Option<String>,
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub legal_entity_type: Option<String>,
    pub active: bool,
    pub details: Value,
    pub account_summary: Option<String>,
    pub hash: Option<String>,
    pub owned_by_customer: bool,
}

impl Recipient {
    /// Best-effort account number from the type-specific details
    pub fn account_number(&self) -> Option<&str> {
        let details = self.details.as_object()?;
        ACCOUNT_NUMBER_FIELDS
            .iter()
            .filter_map(|field| details.get(*field).and_then(Value::as_str))
            .find(|value| !value.is_empty())
    }

    /// Name to show for the recipient, falling back to the account summary
    /// and then the given and family names
    pub fn display_name(&self) -> String {
        if !self.name.full_name.is_empty() {
            return self.name.full_name.clone();
        }
        if let Some(summary) = self.account_summary.as_deref().filter(|s| !s.is_empty()) {
            return summary.to_string();
        }
        [self.name.given_name.as_deref(), self.name.family_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Filters for listing recipients
#[derive(Debug, Clone, Default)]
pub struct ListRecipientsRequest {
    pub profile_id: Option<i64>,
    pub currency: Option<String>,
    pub active: Option<bool>,
    pub recipient_type: Option<String>,
    pub size: Option<u32>,
    pub seek_position: Option<i64>,
    pub sort: Option<String>,
}

impl ListRecipientsRequest {
    pub fn query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query
            .set_opt("profileId", self.profile_id)
            .set_opt("currency", self.currency.as_deref())
            .set_opt("active", self.active)
            .set_opt("type", self.recipient_type.as_deref())
            .set_opt("size", self.size.filter(|s| *s > 0))
            .set_opt("seekPosition", self.seek_position.filter(|p| *p > 0))
            .set_opt("sort", self.sort.as_deref());
        query
    }
}

/// Page of recipients returned by the v2 accounts endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipientPage {
    #[serde(default)]
    content: Vec<Recipient>,
}

/// Parameters for creating a recipient account
#[derive(Debug, Clone, Default)]
pub struct NewRecipientRequest {
    pub profile_id: i64,
    pub currency: String,
    /// sort_code, iban, us, email, ...
    pub recipient_type: String,
    pub account_holder_name: String,
    pub owned_by_customer: Option<bool>,
    pub details: Map<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewRecipientBody<'a> {
    currency: &'a str,
    #[serde(rename = "type")]
    recipient_type: &'a str,
    profile: i64,
    account_holder_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    owned_by_customer: Option<bool>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    details: &'a Map<String, Value>,
}

impl<'a> From<&'a NewRecipientRequest> for NewRecipientBody<'a> {
    fn from(req: &'a NewRecipientRequest) -> Self {
        Self {
            currency: &req.currency,
            recipient_type: &req.recipient_type,
            profile: req.profile_id,
            account_holder_name: &req.account_holder_name,
            owned_by_customer: req.owned_by_customer,
            details: &req.details,
        }
    }
}

impl ApiClient {
    /// Lists recipient accounts matching `req`
    pub async fn list_recipients(
        &self,
        req: &ListRecipientsRequest,
    ) -> Result<Vec<Recipient>, ApiError> {
        let page: RecipientPage = self
            .get_cached("recipients", "/v2/accounts", &req.query())
            .await?;
        Ok(page.content)
    }

    /// Creates a recipient account
    pub async fn create_recipient(&self, req: &NewRecipientRequest) -> Result<Recipient, ApiError> {
        self.post_json("/v1/accounts", &NewRecipientBody::from(req)).await
    }
}
