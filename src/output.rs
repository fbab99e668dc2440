//! Plain-text rendering of API results
//!
//! Every function returns the finished text so callers decide where it goes.

use std::collections::HashMap;

use crate::api::{Profile, Quote, Recipient, Transfer, User};
use crate::ledger::TransferRecord;

/// Placeholder for missing values in tables
const NONE: &str = "N/A";

pub fn format_user(user: &User) -> String {
    let mut lines = vec![
        "User Details:".to_string(),
        "=============".to_string(),
        format!("ID:      {}", user.id),
        format!("Name:    {}", user.name.as_deref().unwrap_or(NONE)),
        format!("Email:   {}", user.email.as_deref().unwrap_or(NONE)),
        format!("Active:  {}", user.active),
    ];
    if let Some(phone) = user.details.as_ref().and_then(|d| d.phone_number.as_deref()) {
        lines.push(format!("Phone:   {}", phone));
    }
    lines.join("\n")
}

pub fn format_profiles(profiles: &[Profile]) -> String {
    if profiles.is_empty() {
        return "No profiles found".to_string();
    }

    let mut lines = vec![
        format!("{:<10} {:<15} {:<10} {:<25} {:<20}", "ID", "Type", "State", "Email", "Name"),
        "-".repeat(85),
    ];
    for p in profiles {
        lines.push(format!(
            "{:<10} {:<15} {:<10} {:<25} {:<20}",
            p.id,
            p.profile_type,
            p.current_state.as_deref().unwrap_or(NONE),
            p.email.as_deref().unwrap_or(NONE),
            p.display_name().unwrap_or_else(|| NONE.to_string()),
        ));
    }
    lines.join("\n")
}

pub fn format_recipients(recipients: &[Recipient]) -> String {
    if recipients.is_empty() {
        return "No recipients found".to_string();
    }

    let mut lines = vec![
        format!(
            "{:<10} {:<30} {:<10} {:<15} {:<10} {:<20}",
            "ID", "Name", "Currency", "Country", "Type", "Account Number"
        ),
        "-".repeat(100),
    ];
    for r in recipients {
        let name = if r.name.full_name.is_empty() { NONE } else { r.name.full_name.as_str() };
        lines.push(format!(
            "{:<10} {:<30} {:<10} {:<15} {:<10} {:<20}",
            r.id,
            name,
            r.currency,
            r.country.as_deref().unwrap_or(NONE),
            r.recipient_type,
            r.account_number().unwrap_or(NONE),
        ));
    }
    lines.join("\n")
}

pub fn format_recipient_created(r: &Recipient) -> String {
    [
        "Recipient Created:".to_string(),
        "==================".to_string(),
        format!("ID:                {}", r.id),
        format!("Name:              {}", r.name.full_name),
        format!("Currency:          {}", r.currency),
        format!("Country:           {}", r.country.as_deref().unwrap_or(NONE)),
        format!("Type:              {}", r.recipient_type),
        format!("Legal Entity Type: {}", r.legal_entity_type.as_deref().unwrap_or(NONE)),
        format!("Account Summary:   {}", r.account_summary.as_deref().unwrap_or(NONE)),
        format!("Active:            {}", r.active),
        format!("Owned by Customer: {}", r.owned_by_customer),
        format!("Hash:              {}", r.hash.as_deref().unwrap_or(NONE)),
    ]
    .join("\n")
}

pub fn format_quote(quote: &Quote) -> String {
    let mut lines = vec![
        "Quote Details:".to_string(),
        "==============".to_string(),
        format!("Quote ID:           {}", quote.id),
        format!("Status:             {}", quote.status),
        format!("Source:             {:.2} {}", quote.source_amount, quote.source_currency),
        format!("Target:             {:.2} {}", quote.target_amount, quote.target_currency),
        format!("Exchange Rate:      {:.6}", quote.rate),
        format!("Rate Type:          {}", quote.rate_type),
        format!("Created:            {}", quote.created_time),
        format!("Rate Expires:       {}", quote.rate_expiration_time),
        format!("Quote Expires:      {}", quote.expiration_time),
    ];

    if !quote.payment_options.is_empty() {
        lines.push(String::new());
        lines.push("Payment Options:".to_string());
        for (i, opt) in quote.payment_options.iter().enumerate() {
            lines.push(String::new());
            if opt.disabled {
                lines.push(format!("[{}] {} → {} (DISABLED)", i + 1, opt.pay_in, opt.pay_out));
                if let Some(reason) = &opt.disabled_reason {
                    lines.push(format!("    Reason: {}", reason.message));
                }
                continue;
            }
            lines.push(format!("[{}] {} → {}", i + 1, opt.pay_in, opt.pay_out));
            lines.push(format!(
                "    Source:     {:.2} {}",
                opt.source_amount, quote.source_currency
            ));
            lines.push(format!(
                "    Target:     {:.2} {}",
                opt.target_amount, quote.target_currency
            ));
            lines.push(format!("    Fee:        {:.2} {}", opt.fee.total, quote.source_currency));
            let delivery = opt
                .formatted_estimated_delivery
                .as_deref()
                .filter(|d| !d.is_empty());
            if let Some(delivery) = delivery {
                lines.push(format!("    Delivery:   {}", delivery));
            }
        }
    }

    if !quote.notices.is_empty() {
        lines.push(String::new());
        lines.push("Notices:".to_string());
        for notice in &quote.notices {
            lines.push(format!("[{}] {}", notice.notice_type, notice.text));
            if let Some(link) = &notice.link {
                lines.push(format!("    Link: {}", link));
            }
        }
    }

    lines.join("\n")
}

/// Detail block shared by created transfers and ledger records
fn transfer_lines(t: &TransferRecord) -> Vec<String> {
    let mut lines = vec![
        format!("ID:                      {}", t.id),
        format!("Status:                  {}", t.status),
        format!("Source:                  {:.2} {}", t.source_value, t.source_currency),
        format!("Target:                  {:.2} {}", t.target_value, t.target_currency),
        format!("Exchange Rate:           {:.6}", t.rate),
        format!("Target Account:          {}", t.target_account),
        format!("Quote ID:                {}", t.quote_uuid),
        format!("Customer Transaction ID: {}", t.customer_transaction_id),
        format!("Created:                 {}", t.created),
    ];
    if let Some(source_account) = t.source_account {
        lines.push(format!("Source Account:          {}", source_account));
    }
    if let Some(reference) = t.reference.as_deref().filter(|r| !r.is_empty()) {
        lines.push(format!("Reference:               {}", reference));
    }
    if let Some(session) = t.payin_session_id.as_deref().filter(|s| !s.is_empty()) {
        lines.push(format!("Payin Session ID:        {}", session));
    }
    lines.push(format!("Has Active Issues:       {}", t.has_active_issues));
    lines
}

pub fn format_transfer_created(transfer: &Transfer) -> String {
    let mut lines = vec!["Transfer Created:".to_string(), "=================".to_string()];
    lines.extend(transfer_lines(&TransferRecord::from(transfer)));
    lines.join("\n")
}

pub fn format_transfer_record(record: &TransferRecord) -> String {
    let mut lines = vec!["Recorded Transfer:".to_string(), "==================".to_string()];
    lines.extend(transfer_lines(record));
    lines.join("\n")
}

/// Summary printed after `send-to` creates a transfer
pub fn format_transfer_sent(transfer: &Transfer, recipient_name: &str) -> String {
    let mut lines = vec![
        "✓ Transfer Created Successfully:".to_string(),
        "================================".to_string(),
        format!("Transfer ID:             {}", transfer.id),
        format!("Status:                  {}", transfer.status),
        format!("Recipient:               {}", recipient_name),
        format!(
            "Source:                  {:.2} {}",
            transfer.source_value, transfer.source_currency
        ),
        format!(
            "Target:                  {:.2} {}",
            transfer.target_value, transfer.target_currency
        ),
        format!("Exchange Rate:           {:.6}", transfer.rate),
        format!("Quote ID:                {}", transfer.quote_uuid),
        format!("Customer Transaction ID: {}", transfer.customer_transaction_id),
        format!("Created:                 {}", transfer.created),
    ];
    if let Some(reference) = transfer.reference_text() {
        lines.push(format!("Reference:               {}", reference));
    }
    lines.join("\n")
}

/// What `send-to --dry-run` would do
#[derive(Debug, Clone)]
pub struct SendPlan<'a> {
    pub recipient: &'a Recipient,
    pub amount: f64,
    pub currency: &'a str,
    pub profile_id: i64,
    pub customer_transaction_id: &'a str,
    pub reference: Option<&'a str>,
    pub source_account: Option<i64>,
}

pub fn format_dry_run(plan: &SendPlan<'_>) -> String {
    let r = plan.recipient;
    let mut lines = vec![
        "📋 Dry-run mode - no resources will be created".to_string(),
        "============================================".to_string(),
        format!("Recipient:               {} (ID: {})", r.name.full_name, r.id),
        format!("Recipient Currency:      {}", r.currency),
        format!("Target Amount:           {:.2} {}", plan.amount, r.currency),
        format!("Profile ID:              {}", plan.profile_id),
        format!("Customer Transaction ID: {}", plan.customer_transaction_id),
    ];
    if let Some(reference) = plan.reference {
        lines.push(format!("Reference:               {}", reference));
    }
    if let Some(source_account) = plan.source_account {
        lines.push(format!("Source Account:          {}", source_account));
    }
    lines.push(String::new());
    lines.push("What would happen:".to_string());
    lines.push(format!(
        "- Create a quote for {:.2} {} → {}",
        plan.amount, plan.currency, r.currency
    ));
    lines.push("- Create a transfer with the quote".to_string());
    lines.push(String::new());
    lines.push("Run without --dry-run to actually create the transfer".to_string());
    lines.join("\n")
}

/// Transfer table; `recipient_names` maps target account IDs to names
pub fn format_transfers(transfers: &[Transfer], recipient_names: &HashMap<i64, String>) -> String {
    if transfers.is_empty() {
        return "No transfers found".to_string();
    }

    let mut lines = vec![
        format!(
            "{:<10} {:<20} {:<15} {:<30} {:<15} {:<20} {:<10}",
            "ID", "Date", "Source", "Recipient", "Target", "Reference", "Status"
        ),
        "-".repeat(135),
    ];
    for t in transfers {
        let recipient = recipient_names
            .get(&t.target_account)
            .map(String::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or("-");
        lines.push(format!(
            "{:<10} {:<20} {:<15} {:<30} {:<15} {:<20} {:<10}",
            t.id,
            t.created_date(),
            format!("{:.2} {}", t.source_value, t.source_currency),
            recipient,
            format!("{:.2} {}", t.target_value, t.target_currency),
            t.reference_text().unwrap_or("-"),
            t.status,
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer() -> Transfer {
        Transfer {
            id: 50500593,
            target_account: 13967081,
            status: "processing".to_string(),
            created: "2026-10-16 09:12:44".to_string(),
            source_value: 104.17,
            source_currency: "GBP".to_string(),
            target_value: 120.0,
            target_currency: "EUR".to_string(),
            rate: 1.15196,
            quote_uuid: "q-1".to_string(),
            customer_transaction_id: "tok-1".to_string(),
            reference: Some("rent".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_lists() {
        assert_eq!(format_profiles(&[]), "No profiles found");
        assert_eq!(format_recipients(&[]), "No recipients found");
        assert_eq!(format_transfers(&[], &HashMap::new()), "No transfers found");
    }

    #[test]
    fn test_transfers_table_resolves_recipient_names() {
        let mut names = HashMap::new();
        names.insert(13967081, "Ann Lee".to_string());

        let text = format_transfers(&[transfer()], &names);
        let row = text.lines().nth(2).expect("row should exist");

        assert!(row.starts_with("50500593"));
        assert!(row.contains("2026-10-16"));
        assert!(row.contains("104.17 GBP"));
        assert!(row.contains("Ann Lee"));
        assert!(row.contains("120.00 EUR"));
        assert!(row.contains("rent"));
    }

    #[test]
    fn test_transfers_table_unknown_recipient() {
        let text = format_transfers(&[transfer()], &HashMap::new());
        let row = text.lines().nth(2).unwrap();
        assert!(row.contains(" - "));
    }

    #[test]
    fn test_transfer_record_block_includes_optional_fields() {
        let mut record = TransferRecord::from(&transfer());
        record.payin_session_id = Some("pis-889".to_string());

        let text = format_transfer_record(&record);

        assert!(text.contains("Customer Transaction ID: tok-1"));
        assert!(text.contains("Exchange Rate:           1.151960"));
        assert!(text.contains("Reference:               rent"));
        assert!(text.contains("Payin Session ID:        pis-889"));
        assert!(!text.contains("Source Account:"));
    }

    #[test]
    fn test_profiles_table_uses_display_name() {
        let profile = Profile {
            id: 7,
            profile_type: "BUSINESS".to_string(),
            business_name: Some("Doe Ltd".to_string()),
            ..Default::default()
        };

        let text = format_profiles(&[profile]);

        assert!(text.lines().nth(2).unwrap().contains("Doe Ltd"));
    }
}
