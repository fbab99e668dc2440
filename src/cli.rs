//! Command-line interface parsing for wise-cli
//!
//! This module defines the clap command tree and turns parsed arguments into
//! API requests, rejecting flag combinations the API would refuse.

use chrono::{DateTime, Duration, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::api::{
    ListRecipientsRequest, ListTransfersRequest, NewQuoteRequest, NewRecipientRequest,
    NewTransferRequest,
};
use crate::ledger::is_valid_token;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// No token from the flag, the environment or a previous login
    #[error(
        "API token required: set --token flag or WISE_API_TOKEN env var, or run 'wise-cli login'"
    )]
    MissingToken,

    /// A flag that is optional in general is required in this context
    #[error("{0} is required")]
    Missing(String),

    /// Neither quote amount was given
    #[error("either source-amount or target-amount is required")]
    NoAmount,

    /// Both quote amounts were given
    #[error("only one of source-amount or target-amount can be specified")]
    ConflictingAmounts,

    /// An amount was zero or negative
    #[error("Invalid amount: {0} (must be greater than 0)")]
    InvalidAmount(f64),

    /// No profile given and none selected
    #[error("profile-id is required: use --profile-id or run 'wise-cli select-profile <id>'")]
    NoProfile,

    /// Login received an empty token
    #[error("token cannot be empty")]
    EmptyToken,

    /// The customer transaction id cannot be recorded locally
    #[error(
        "Invalid customer transaction id: '{0}' (use letters, digits, '.', '_' or '-', \
         not starting with '.')"
    )]
    InvalidTransactionId(String),

    /// The look-back window reaches before the earliest representable date
    #[error("Invalid number of days: {0}")]
    InvalidDays(u32),
}

/// wise-cli - Send money and inspect your Wise account from the terminal
#[derive(Parser, Debug)]
#[command(name = "wise-cli")]
#[command(about = "Command-line client for the Wise API")]
#[command(version)]
pub struct Cli {
    /// Wise API token (defaults to the token saved by `login`)
    #[arg(long, global = true, env = "WISE_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Force refresh cache, bypass cached responses
    #[arg(long, global = true)]
    pub refresh: bool,

    /// Log cache and request activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save your Wise API token for future use (reads from stdin)
    Login,
    /// Show the user the API token belongs to
    Me,
    /// List profiles
    Profiles,
    /// Select a profile by ID or name to use as the default profile
    SelectProfile {
        /// Profile ID, exact name, or part of a name
        profile: String,
    },
    /// List recipient accounts
    Recipients(RecipientsArgs),
    /// Get an exchange quote
    Quote(QuoteArgs),
    /// Create new resources like quotes, transfers, and recipients
    #[command(subcommand)]
    New(NewCommand),
    /// Send money to a recipient by name, creating a quote and transfer
    SendTo(SendToArgs),
    /// List transfers (defaults to the last 30 days)
    Transfers(TransfersArgs),
    /// Show a transfer previously created from this machine
    Transfer {
        /// Customer transaction ID the transfer was created with
        customer_transaction_id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum NewCommand {
    /// Create an authenticated quote
    Quote(QuoteArgs),
    /// Create a transfer based on a quote
    Transfer(NewTransferArgs),
    /// Create a recipient account for receiving payments
    Recipient(NewRecipientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RecipientsArgs {
    /// Profile ID to filter by
    #[arg(short, long = "profile-id")]
    pub profile_id: Option<i64>,
    /// Filter by currency (e.g. USD,GBP)
    #[arg(short, long)]
    pub currency: Option<String>,
    /// Filter by account type (e.g. iban,swift_code)
    #[arg(short = 't', long = "type")]
    pub recipient_type: Option<String>,
    /// Number of results to return
    #[arg(short, long, default_value_t = 20)]
    pub size: u32,
}

impl RecipientsArgs {
    pub fn to_request(&self) -> ListRecipientsRequest {
        ListRecipientsRequest {
            profile_id: self.profile_id.filter(|id| *id != 0),
            currency: self.currency.clone().filter(|c| !c.is_empty()),
            recipient_type: self.recipient_type.clone().filter(|t| !t.is_empty()),
            size: Some(self.size),
            ..Default::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct QuoteArgs {
    /// Profile ID
    #[arg(short, long = "profile-id")]
    pub profile_id: i64,
    /// Source currency code
    #[arg(short, long = "source-currency")]
    pub source_currency: String,
    /// Target currency code
    #[arg(short, long = "target-currency")]
    pub target_currency: String,
    /// Amount in source currency (either this or target-amount)
    #[arg(long = "source-amount")]
    pub source_amount: Option<f64>,
    /// Amount in target currency (either this or source-amount)
    #[arg(long = "target-amount")]
    pub target_amount: Option<f64>,
}

impl QuoteArgs {
    pub fn to_request(&self) -> Result<NewQuoteRequest, CliError> {
        if self.profile_id == 0 {
            return Err(CliError::Missing("profile-id".to_string()));
        }
        let (source_amount, target_amount) = match (self.source_amount, self.target_amount) {
            (None, None) => return Err(CliError::NoAmount),
            (Some(_), Some(_)) => return Err(CliError::ConflictingAmounts),
            (Some(amount), None) => (Some(positive(amount)?), None),
            (None, Some(amount)) => (None, Some(positive(amount)?)),
        };

        Ok(NewQuoteRequest {
            profile_id: self.profile_id,
            source_currency: self.source_currency.clone(),
            target_currency: self.target_currency.clone(),
            source_amount,
            target_amount,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct NewTransferArgs {
    /// Target account ID
    #[arg(short = 'a', long = "target-account")]
    pub target_account: i64,
    /// Quote UUID
    #[arg(short, long = "quote-uuid")]
    pub quote_uuid: String,
    /// Customer transaction ID for idempotency
    #[arg(short = 'c', long = "customer-transaction-id")]
    pub customer_transaction_id: String,
    /// Payment reference
    #[arg(short, long)]
    pub reference: Option<String>,
    /// Source account ID
    #[arg(short, long = "source-account")]
    pub source_account: Option<i64>,
}

impl NewTransferArgs {
    pub fn to_request(&self) -> Result<NewTransferRequest, CliError> {
        if self.target_account == 0 {
            return Err(CliError::Missing("target-account".to_string()));
        }
        if self.quote_uuid.is_empty() {
            return Err(CliError::Missing("quote-uuid".to_string()));
        }
        if self.customer_transaction_id.is_empty() {
            return Err(CliError::Missing("customer-transaction-id".to_string()));
        }
        if !is_valid_token(&self.customer_transaction_id) {
            return Err(CliError::InvalidTransactionId(
                self.customer_transaction_id.clone(),
            ));
        }

        Ok(NewTransferRequest {
            target_account: self.target_account,
            quote_uuid: self.quote_uuid.clone(),
            customer_transaction_id: self.customer_transaction_id.clone(),
            reference: self.reference.clone().filter(|r| !r.is_empty()),
            source_account: self.source_account.filter(|id| *id != 0),
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct NewRecipientArgs {
    /// Profile ID
    #[arg(short, long = "profile-id")]
    pub profile_id: i64,
    /// Recipient currency code
    #[arg(short, long)]
    pub currency: String,
    /// Recipient type: sort_code, iban, us, email
    #[arg(short = 't', long = "type")]
    pub recipient_type: String,
    /// Account holder full name
    #[arg(short = 'n', long = "account-holder-name")]
    pub account_holder_name: String,
    /// Whether the account is owned by the customer
    #[arg(short, long = "owned-by-customer", default_value_t = true, action = ArgAction::Set)]
    pub owned_by_customer: bool,
    /// Sort code (required for sort_code type)
    #[arg(long = "sort-code")]
    pub sort_code: Option<String>,
    /// Account number (required for sort_code/us type)
    #[arg(long = "account-number")]
    pub account_number: Option<String>,
    /// IBAN (required for iban type)
    #[arg(long)]
    pub iban: Option<String>,
    /// Routing number (required for us type)
    #[arg(long = "routing-number")]
    pub routing_number: Option<String>,
    /// Account type: CHECKING or SAVINGS (required for us type)
    #[arg(long = "account-type")]
    pub account_type: Option<String>,
    /// Email address (required for email type)
    #[arg(long)]
    pub email: Option<String>,
    /// Legal type: PRIVATE or BUSINESS
    #[arg(long = "legal-type")]
    pub legal_type: Option<String>,
}

impl NewRecipientArgs {
    /// Returns the value of a type-specific flag, or an error naming it
    fn require(
        value: &Option<String>,
        flag: &str,
        recipient_type: &str,
    ) -> Result<Value, CliError> {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(|v| Value::String(v.to_string()))
            .ok_or_else(|| CliError::Missing(format!("{} for {} type", flag, recipient_type)))
    }

    /// Collects the details block for the recipient type
    fn details(&self) -> Result<Map<String, Value>, CliError> {
        let t = self.recipient_type.as_str();
        let mut details = Map::new();

        match t {
            "sort_code" => {
                let sort_code = Self::require(&self.sort_code, "sort-code", t)?;
                let account_number = Self::require(&self.account_number, "account-number", t)?;
                details.insert("sortCode".into(), sort_code);
                details.insert("accountNumber".into(), account_number);
            }
            "iban" => {
                details.insert("iban".into(), Self::require(&self.iban, "iban", t)?);
            }
            "us" => {
                let routing_number = Self::require(&self.routing_number, "routing-number", t)?;
                let account_number = Self::require(&self.account_number, "account-number", t)?;
                let account_type = Self::require(&self.account_type, "account-type", t)?;
                details.insert("routingNumber".into(), routing_number);
                details.insert("accountNumber".into(), account_number);
                details.insert("accountType".into(), account_type);
            }
            "email" => {
                details.insert("email".into(), Self::require(&self.email, "email", t)?);
            }
            _ => {}
        }

        if t != "email" {
            if let Some(legal_type) = self.legal_type.as_deref().filter(|v| !v.is_empty()) {
                details.insert("legalType".into(), Value::String(legal_type.to_string()));
            }
        }

        Ok(details)
    }

    pub fn to_request(&self) -> Result<NewRecipientRequest, CliError> {
        if self.profile_id == 0 {
            return Err(CliError::Missing("profile-id".to_string()));
        }

        Ok(NewRecipientRequest {
            profile_id: self.profile_id,
            currency: self.currency.clone(),
            recipient_type: self.recipient_type.clone(),
            account_holder_name: self.account_holder_name.clone(),
            owned_by_customer: Some(self.owned_by_customer),
            details: self.details()?,
        })
    }
}

#[derive(Args, Debug, Clone)]
pub struct SendToArgs {
    /// Full name of the recipient, exactly as listed by `recipients`
    pub recipient_name: String,
    /// Amount the recipient should receive
    pub amount: f64,
    /// Currency to pay with
    pub currency: String,
    /// Payment reference (the --reference flag takes precedence)
    #[arg(value_name = "REFERENCE")]
    pub reference_arg: Option<String>,
    /// Profile ID (uses the selected profile if not set)
    #[arg(short, long = "profile-id")]
    pub profile_id: Option<i64>,
    /// Customer transaction ID (auto-generated if not set)
    #[arg(short = 'c', long = "customer-transaction-id")]
    pub customer_transaction_id: Option<String>,
    /// Payment reference
    #[arg(short, long)]
    pub reference: Option<String>,
    /// Source account ID
    #[arg(short, long = "source-account")]
    pub source_account: Option<i64>,
    /// Validate without creating quote or transfer
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

impl SendToArgs {
    /// Validates the amount and currency
    pub fn validate(&self) -> Result<(), CliError> {
        positive(self.amount)?;
        if self.currency.trim().is_empty() {
            return Err(CliError::Missing("currency".to_string()));
        }
        Ok(())
    }

    /// The reference flag, falling back to the positional reference
    pub fn effective_reference(&self) -> Option<String> {
        self.reference
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| self.reference_arg.clone().filter(|r| !r.is_empty()))
    }

    /// The given customer transaction ID, or a fresh UUID v4
    pub fn customer_transaction_id(&self) -> Result<String, CliError> {
        match self.customer_transaction_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) if is_valid_token(id) => Ok(id.to_string()),
            Some(id) => Err(CliError::InvalidTransactionId(id.to_string())),
            None => Ok(uuid::Uuid::new_v4().to_string()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TransfersArgs {
    /// Profile ID to filter by
    #[arg(short, long = "profile-id")]
    pub profile_id: Option<i64>,
    /// Filter by transfer status (e.g. incoming, outgoing, cancelled)
    #[arg(short, long)]
    pub status: Option<String>,
    /// Number of days to look back
    #[arg(short, long, default_value_t = 30)]
    pub days: u32,
}

impl TransfersArgs {
    /// Builds the list request for the window ending at `now`
    pub fn to_request(&self, now: DateTime<Utc>) -> Result<ListTransfersRequest, CliError> {
        let since = Duration::try_days(i64::from(self.days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or(CliError::InvalidDays(self.days))?;

        Ok(ListTransfersRequest {
            profile_id: self.profile_id.filter(|id| *id != 0),
            status: self.status.clone().filter(|s| !s.is_empty()),
            since: Some(since),
            until: Some(now),
            limit: Some(100),
            offset: None,
        })
    }
}

fn positive(amount: f64) -> Result<f64, CliError> {
    if amount > 0.0 && amount.is_finite() {
        Ok(amount)
    } else {
        Err(CliError::InvalidAmount(amount))
    }
}
