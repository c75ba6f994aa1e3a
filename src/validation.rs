use std::fmt;

use bigdecimal::BigDecimal;

use crate::domain::TransactionDraft;

pub const EVM_ADDRESS_LEN: usize = 42;
pub const PHONE_MAX_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

pub fn sanitize_string(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !ch.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_positive_amount(amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new("amount", "must be greater than zero"));
    }

    Ok(())
}

pub fn validate_evm_address(address: &str) -> ValidationResult {
    let address = sanitize_string(address);
    validate_required("address", &address)?;

    if address.len() != EVM_ADDRESS_LEN {
        return Err(ValidationError::new(
            "address",
            format!("must be exactly {} characters", EVM_ADDRESS_LEN),
        ));
    }

    if !address.starts_with("0x") {
        return Err(ValidationError::new("address", "must start with '0x'"));
    }

    if hex::decode(&address[2..]).is_err() {
        return Err(ValidationError::new("address", "must be hexadecimal"));
    }

    Ok(())
}

pub fn validate_phone(phone: &str) -> ValidationResult {
    let phone = sanitize_string(phone);
    validate_required("phone", &phone)?;

    if phone.len() > PHONE_MAX_LEN {
        return Err(ValidationError::new(
            "phone",
            format!("must be at most {} characters", PHONE_MAX_LEN),
        ));
    }

    if !phone
        .chars()
        .all(|ch| ch.is_ascii_digit() || ch == '+' || ch == ' ')
    {
        return Err(ValidationError::new(
            "phone",
            "must contain only digits, spaces and '+'",
        ));
    }

    Ok(())
}

/// Checks a draft before it leaves the client: positive amount and channel
/// legality on both legs for the chosen direction.
pub fn validate_draft(draft: &TransactionDraft) -> ValidationResult {
    validate_positive_amount(&draft.amount)?;

    if !draft.direction.allows_deposit(draft.funds_in) {
        return Err(ValidationError::new(
            "funds_in",
            format!(
                "{} is not a valid deposit channel for {}",
                draft.funds_in, draft.direction
            ),
        ));
    }

    if !draft.direction.allows_receive(draft.funds_out) {
        return Err(ValidationError::new(
            "funds_out",
            format!(
                "{} is not a valid receive channel for {}",
                draft.funds_out, draft.direction
            ),
        ));
    }

    Ok(())
}
