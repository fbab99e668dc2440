//! Profiles and the authenticated user

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, QueryParams};

/// Postal address attached to a profile or user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub id: Option<i64>,
    pub address_first_line: Option<String>,
    pub city: Option<String>,
    pub country_iso2_code: Option<String>,
    pub post_code: Option<String>,
}

/// A personal or business profile belonging to the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub id: i64,
    pub public_id: Option<String>,
    pub user_id: Option<i64>,
    /// PERSONAL or BUSINESS
    #[serde(rename = "type")]
    pub profile_type: String,
    pub email: Option<String>,
    pub current_state: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub business_name: Option<String>,
    pub address: Option<Address>,
    pub created_at: Option<String>,
}

impl Profile {
    /// Full name for personal profiles, business name otherwise
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name, &self.business_name) {
            (Some(first), Some(last), _) => Some(format!("{} {}", first, last)),
            (_, _, Some(business)) => Some(business.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserDetails {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
    pub occupation: Option<String>,
}

/// The user the API token belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub active: bool,
    pub details: Option<UserDetails>,
}

impl ApiClient {
    /// Fetches the authenticated user (never cached)
    pub async fn get_me(&self) -> Result<User, ApiError> {
        self.get_json("/v1/me").await
    }

    /// Lists all profiles of the authenticated user
    pub async fn list_profiles(&self) -> Result<Vec<Profile>, ApiError> {
        self.get_cached("profiles", "/v2/profiles", &QueryParams::new())
            .await
    }
}
