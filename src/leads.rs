//! Contact validation for captured leads and masking for the marketplace.
//!
//! Homeowners type their own contact details into the capture form, so the
//! same checks used on inbound leads apply: reject placeholder emails and
//! normalize Brazilian phones to E.164.
use crate::errors::AppError;
use crate::models::{CaptureLeadRequest, Lead};
use phonenumber::country::Id as CountryId;
use phonenumber::Mode;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    // RFC 5322 simplified email regex
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("email regex is valid")
    })
}

/// Validate email address
///
/// Checks for:
/// - Basic email format (contains @ and .)
/// - Fake/placeholder patterns (repeated digits like 9999, 1111)
/// - Minimum length requirements
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 5 || !email.contains('@') || !email.contains('.') {
        return false;
    }

    let fake_patterns = ["999999", "111111", "000000", "123456789"];
    if let Some(pattern) = fake_patterns.iter().find(|p| email.contains(*p)) {
        tracing::warn!("❌ Invalid email detected (fake pattern '{}'): {}", pattern, email);
        return false;
    }

    if !email_regex().is_match(email) {
        tracing::warn!("❌ Invalid email format: {}", email);
        return false;
    }

    true
}

/// Validate and normalize Brazilian phone number
///
/// Parses with the BR region and returns the E.164 form (+5511987654321).
///
/// Returns: (is_valid, normalized_phone_or_error_msg)
pub fn validate_br_phone(raw: &str) -> (bool, String) {
    if raw.trim().is_empty() || raw.len() < 8 {
        return (false, "Phone too short".to_string());
    }

    match phonenumber::parse(Some(CountryId::BR), raw) {
        Ok(number) => {
            if phonenumber::is_valid(&number) {
                let formatted = number.format().mode(Mode::E164).to_string();
                tracing::debug!("✓ Valid BR phone: {} → {}", raw, formatted);
                (true, formatted)
            } else {
                tracing::warn!("❌ Invalid BR phone number: {}", raw);
                (false, "Invalid Brazilian phone number".to_string())
            }
        }
        Err(e) => {
            tracing::warn!("❌ Failed to parse BR phone '{}': {:?}", raw, e);
            (false, format!("Parse error: {:?}", e))
        }
    }
}

/// Contact details that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Validates the capture form, returning pt-BR messages on rejection.
pub fn validate_contact(request: &CaptureLeadRequest) -> Result<ValidatedContact, AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Informe o seu nome".to_string()));
    }

    let email = request.email.trim().to_lowercase();
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("E-mail inválido".to_string()));
    }

    let (valid, phone) = validate_br_phone(request.phone.trim());
    if !valid {
        return Err(AppError::BadRequest("Telefone inválido".to_string()));
    }

    Ok(ValidatedContact {
        name: name.to_string(),
        email,
        phone,
    })
}

/// `joao.silva@gmail.com` → `j*********@gmail.com`
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let mut chars = local.chars();
            let first = chars.next().map(String::from).unwrap_or_default();
            format!("{}{}@{}", first, "*".repeat(chars.count()), domain)
        }
        None => "*".repeat(email.chars().count()),
    }
}

/// Keeps country + area code and the last two digits.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..5].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 7), tail)
}

/// Public marketplace view of a lead. Contact details stay masked for every
/// status; the buyer reads them through its own purchased-leads view.
#[derive(Debug, Clone, Serialize)]
pub struct LeadListing {
    #[serde(flatten)]
    pub lead: Lead,
}

impl LeadListing {
    pub fn from_lead(lead: &Lead) -> Self {
        let mut lead = lead.clone();
        lead.email = mask_email(&lead.email);
        lead.phone = mask_phone(&lead.phone);
        Self { lead }
    }
}
