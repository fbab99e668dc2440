//! Command execution
//!
//! [`App`] owns everything a run needs: the storage root and the stores built
//! on it, the resolved API token and the refresh flag. Each subcommand is
//! one method that talks to the API and writes its report to `out`.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{
    ApiClient, ApiError, ListRecipientsRequest, NewQuoteRequest, NewTransferRequest, Profile,
    Recipient, Transfer,
};
use crate::cache::ResponseCache;
use crate::cli::{Cli, CliError, Command, NewCommand, SendToArgs, TransfersArgs};
use crate::config::{self, ConfigError, CredentialStore, SelectedProfile, StorageRoot};
use crate::ledger::{LedgerError, TransferLedger, TransferRecord};
use crate::output;

/// Number of recipients fetched to label the transfers table
const RECIPIENT_LOOKUP_SIZE: u32 = 1000;

/// Top-level error for a wise-cli run
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cli(#[from] CliError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reading stdin or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("recipient not found: {0}")]
    RecipientNotFound(String),
}

/// Everything a single invocation works with
#[derive(Debug, Clone)]
pub struct App {
    root: StorageRoot,
    credentials: CredentialStore,
    cache: ResponseCache,
    ledger: TransferLedger,
    base_url: String,
    token: Option<String>,
    refresh: bool,
}

impl App {
    pub fn new(
        root: StorageRoot,
        base_url: impl Into<String>,
        token: Option<String>,
        refresh: bool,
    ) -> Self {
        Self {
            credentials: CredentialStore::new(root.clone()),
            cache: ResponseCache::new(&root),
            ledger: TransferLedger::new(&root),
            root,
            base_url: base_url.into(),
            token: token.filter(|t| !t.trim().is_empty()),
            refresh,
        }
    }

    /// Builds the app from parsed arguments and the environment
    ///
    /// The token comes from `--token` or `WISE_API_TOKEN`, then from the file
    /// saved by `login`. A storage root that cannot be created is only
    /// reported; commands that need it will fail on their own.
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        let root = StorageRoot::locate()?;
        if let Err(err) = root.ensure() {
            warn!("{}", err);
        }

        let mut app = Self::new(root, config::api_base_url(), cli.token.clone(), cli.refresh);
        if app.token.is_none() {
            app.token = match app.credentials.load_token() {
                Ok(token) => token,
                Err(err) => {
                    warn!("failed to load saved token: {}", err);
                    None
                }
            };
        }
        debug!(root = %app.root.path().display(), base_url = %app.base_url, "app ready");
        Ok(app)
    }

    /// API client for commands that need authentication
    fn client(&self) -> Result<ApiClient, AppError> {
        let token = self.token.as_deref().ok_or(CliError::MissingToken)?;
        Ok(ApiClient::new(self.base_url.as_str(), token, self.cache.clone())
            .with_refresh(self.refresh))
    }

    /// Runs `command`, writing its report to `out`
    pub async fn execute<W: Write>(&self, command: &Command, out: &mut W) -> Result<(), AppError> {
        match command {
            Command::Login => self.login(io::stdin().lock(), out),
            Command::Me => {
                let user = self.client()?.get_me().await?;
                writeln!(out, "{}", output::format_user(&user))?;
                Ok(())
            }
            Command::Profiles => {
                let profiles = self.client()?.list_profiles().await?;
                writeln!(out, "{}", output::format_profiles(&profiles))?;
                Ok(())
            }
            Command::SelectProfile { profile } => self.select_profile(profile, out).await,
            Command::Recipients(args) => {
                let recipients = self.client()?.list_recipients(&args.to_request()).await?;
                writeln!(out, "{}", output::format_recipients(&recipients))?;
                Ok(())
            }
            Command::Quote(args) | Command::New(NewCommand::Quote(args)) => {
                self.quote(&args.to_request()?, out).await
            }
            Command::New(NewCommand::Transfer(args)) => {
                let transfer = self.create_transfer(&args.to_request()?).await?;
                writeln!(out, "{}", output::format_transfer_created(&transfer))?;
                Ok(())
            }
            Command::New(NewCommand::Recipient(args)) => {
                let recipient = self.client()?.create_recipient(&args.to_request()?).await?;
                writeln!(out, "{}", output::format_recipient_created(&recipient))?;
                Ok(())
            }
            Command::SendTo(args) => self.send_to(args, out).await,
            Command::Transfers(args) => self.transfers(args, out).await,
            Command::Transfer { customer_transaction_id } => {
                let record = self.ledger.lookup(customer_transaction_id)?;
                writeln!(out, "{}", output::format_transfer_record(&record))?;
                Ok(())
            }
        }
    }

    /// Reads a token from the first line of `input` and saves it
    pub fn login<R: BufRead, W: Write>(&self, mut input: R, out: &mut W) -> Result<(), AppError> {
        write!(out, "Enter your Wise API token: ")?;
        out.flush()?;

        let mut line = String::new();
        input.read_line(&mut line)?;
        let token = line.trim();
        if token.is_empty() {
            return Err(CliError::EmptyToken.into());
        }

        self.credentials.save_token(token)?;
        writeln!(out)?;
        writeln!(out, "✓ Token saved to {}", self.root.path().display())?;
        Ok(())
    }

    async fn select_profile<W: Write>(&self, query: &str, out: &mut W) -> Result<(), AppError> {
        let profiles = self.client()?.list_profiles().await?;
        let profile = find_profile(&profiles, query)
            .ok_or_else(|| AppError::ProfileNotFound(query.to_string()))?;

        let selected = SelectedProfile {
            id: profile.id,
            name: profile
                .display_name()
                .or_else(|| profile.email.clone())
                .unwrap_or_default(),
            profile_type: profile.profile_type.clone(),
        };
        self.credentials.save_selected_profile(&selected)?;

        writeln!(
            out,
            "✓ Selected profile: {} (ID: {}, Type: {})",
            selected.name, selected.id, selected.profile_type
        )?;
        Ok(())
    }

    async fn quote<W: Write>(&self, req: &NewQuoteRequest, out: &mut W) -> Result<(), AppError> {
        let quote = self.client()?.create_quote(req).await?;
        writeln!(out, "{}", output::format_quote(&quote))?;
        Ok(())
    }

    /// Creates a transfer and records it in the ledger under its token
    async fn create_transfer(&self, req: &NewTransferRequest) -> Result<Transfer, AppError> {
        let transfer = self.client()?.create_transfer(req).await?;
        self.record(&req.customer_transaction_id, &transfer);
        Ok(transfer)
    }

    /// Stores `transfer` in the ledger; failures only warn since the
    /// transfer already exists upstream
    fn record(&self, token: &str, transfer: &Transfer) {
        if let Err(err) = self.ledger.record(token, &TransferRecord::from(transfer)) {
            warn!("failed to save transfer to ledger: {}", err);
        }
    }

    /// Profile from the flag, falling back to the one chosen with `select-profile`
    fn profile_id(&self, flag: Option<i64>) -> Result<i64, AppError> {
        if let Some(id) = flag.filter(|id| *id != 0) {
            return Ok(id);
        }
        self.credentials
            .load_selected_profile()?
            .map(|p| p.id)
            .ok_or_else(|| CliError::NoProfile.into())
    }

    async fn send_to<W: Write>(&self, args: &SendToArgs, out: &mut W) -> Result<(), AppError> {
        let client = self.client()?;
        let profile_id = self.profile_id(args.profile_id)?;
        args.validate()?;
        let token = args.customer_transaction_id()?;
        let reference = args.effective_reference();

        writeln!(out, "Finding recipient: {}", args.recipient_name)?;
        let recipients = client
            .list_recipients(&ListRecipientsRequest {
                profile_id: Some(profile_id),
                currency: Some(args.currency.clone()),
                ..Default::default()
            })
            .await?;
        let recipient = find_recipient(&recipients, &args.recipient_name)
            .ok_or_else(|| AppError::RecipientNotFound(args.recipient_name.clone()))?;
        writeln!(out, "Found recipient: {} (ID: {})", recipient.name.full_name, recipient.id)?;

        if args.dry_run {
            let plan = output::SendPlan {
                recipient,
                amount: args.amount,
                currency: &args.currency,
                profile_id,
                customer_transaction_id: &token,
                reference: reference.as_deref(),
                source_account: args.source_account.filter(|id| *id != 0),
            };
            writeln!(out)?;
            writeln!(out, "{}", output::format_dry_run(&plan))?;
            return Ok(());
        }

        writeln!(
            out,
            "Creating quote: {:.2} {} → {}",
            args.amount, args.currency, recipient.currency
        )?;
        let quote = client
            .create_quote(&NewQuoteRequest {
                profile_id,
                source_currency: args.currency.clone(),
                target_currency: recipient.currency.clone(),
                source_amount: None,
                target_amount: Some(args.amount),
            })
            .await?;
        writeln!(out, "Quote created: {}", quote.id)?;

        writeln!(out, "Creating transfer...")?;
        let transfer = self
            .create_transfer(&NewTransferRequest {
                target_account: recipient.id,
                quote_uuid: quote.id.clone(),
                customer_transaction_id: token,
                reference,
                source_account: args.source_account.filter(|id| *id != 0),
            })
            .await?;

        writeln!(out)?;
        writeln!(out, "{}", output::format_transfer_sent(&transfer, &args.recipient_name))?;
        Ok(())
    }

    async fn transfers<W: Write>(&self, args: &TransfersArgs, out: &mut W) -> Result<(), AppError> {
        let client = self.client()?;
        let request = args.to_request(Utc::now())?;
        let transfers = client.list_transfers(&request).await?;
        if transfers.is_empty() {
            writeln!(out, "{}", output::format_transfers(&transfers, &HashMap::new()))?;
            return Ok(());
        }

        let lookup = ListRecipientsRequest {
            profile_id: args.profile_id.filter(|id| *id != 0),
            size: Some(RECIPIENT_LOOKUP_SIZE),
            ..Default::default()
        };
        let names: HashMap<i64, String> = match client.list_recipients(&lookup).await {
            Ok(recipients) => recipients
                .iter()
                .map(|r| (r.id, r.display_name()))
                .collect(),
            Err(err) => {
                warn!("failed to fetch recipients: {}", err);
                HashMap::new()
            }
        };

        writeln!(out, "{}", output::format_transfers(&transfers, &names))?;
        Ok(())
    }
}

/// Finds a profile by numeric ID, then exact name, then case-insensitive
/// name substring
pub fn find_profile<'a>(profiles: &'a [Profile], query: &str) -> Option<&'a Profile> {
    if let Some(id) = query.trim().parse::<i64>().ok().filter(|id| *id > 0) {
        if let Some(profile) = profiles.iter().find(|p| p.id == id) {
            return Some(profile);
        }
    }

    let names: Vec<(String, &Profile)> = profiles
        .iter()
        .map(|p| (p.display_name().unwrap_or_default(), p))
        .collect();

    if let Some((_, profile)) = names.iter().find(|(name, _)| name == query) {
        return Some(*profile);
    }

    let needle = query.to_lowercase();
    names
        .iter()
        .find(|(name, _)| name.to_lowercase().contains(&needle))
        .map(|(_, profile)| *profile)
}

/// Finds a recipient whose full name matches `name` exactly
pub fn find_recipient<'a>(recipients: &'a [Recipient], name: &str) -> Option<&'a Recipient> {
    recipients.iter().find(|r| r.name.full_name == name)
}
