//! Form input rules for accounts, cart quantities, and catalog entries.
//!
//! Every error's `Display` is the message shown to the customer, and each
//! validator reports the first violation in field order.

use crate::types::email::Email;

/// Largest quantity a single cart line may hold.
pub const MAX_CART_QUANTITY: u32 = 99;

/// Quantity validation failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    #[error("Quantity must be a whole number")]
    NotWholeNumber,
    #[error("Quantity must be at least 1")]
    BelowOne,
    #[error("Quantity must be 0 or greater")]
    Negative,
    #[error("Quantity cannot exceed 99")]
    AboveMax,
}

fn parse_whole(raw: &str) -> Result<i64, QuantityError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| QuantityError::NotWholeNumber)
}

fn bounded(value: i64, min: i64, below: QuantityError) -> Result<u32, QuantityError> {
    if value < min {
        return Err(below);
    }
    if value > i64::from(MAX_CART_QUANTITY) {
        return Err(QuantityError::AboveMax);
    }
    u32::try_from(value).map_err(|_| QuantityError::AboveMax)
}

/// Parse the quantity for an add-to-cart request: a whole number in `1..=99`.
///
/// # Errors
///
/// Returns the violated rule.
pub fn parse_add_quantity(raw: &str) -> Result<u32, QuantityError> {
    bounded(parse_whole(raw)?, 1, QuantityError::BelowOne)
}

/// Parse the quantity for a cart line update: a whole number in `0..=99`.
/// Zero means "remove the line".
///
/// # Errors
///
/// Returns the violated rule.
pub fn parse_update_quantity(raw: &str) -> Result<u32, QuantityError> {
    bounded(parse_whole(raw)?, 0, QuantityError::Negative)
}

/// Account form validation failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Name must be at least 2 characters")]
    NameTooShort,
    #[error("Name must be less than 50 characters")]
    NameTooLong,
    #[error("Invalid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Password must be less than 100 characters")]
    PasswordTooLong,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Validate a display name (2 to 50 characters after trimming).
///
/// # Errors
///
/// Returns [`AccountError::NameTooShort`] or [`AccountError::NameTooLong`].
pub fn validate_name(name: &str) -> Result<String, AccountError> {
    let name = name.trim();
    match name.chars().count() {
        0..2 => Err(AccountError::NameTooShort),
        51.. => Err(AccountError::NameTooLong),
        _ => Ok(name.to_owned()),
    }
}

/// Validate a new password (6 to 100 characters, never trimmed).
///
/// # Errors
///
/// Returns the violated length rule.
pub fn validate_password(password: &str) -> Result<(), AccountError> {
    match password.chars().count() {
        0..6 => Err(AccountError::PasswordTooShort),
        101.. => Err(AccountError::PasswordTooLong),
        _ => Ok(()),
    }
}

/// A validated sign-up submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub name: String,
    pub email: Email,
    pub password: String,
}

impl SignUp {
    /// Validate raw sign-up form fields.
    ///
    /// The email is lowercased so lookups are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn parse(
        name: &str,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Self, AccountError> {
        let name = validate_name(name)?;
        let email = Email::parse(&email.trim().to_lowercase())
            .map_err(|_| AccountError::InvalidEmail)?;
        validate_password(password)?;
        if password != confirm_password {
            return Err(AccountError::PasswordMismatch);
        }
        Ok(Self {
            name,
            email,
            password: password.to_owned(),
        })
    }
}

/// Catalog entry validation failure, used when importing products.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductInputError {
    #[error("{field} must be at least 3 characters")]
    TooShort { field: &'static str },
    #[error("Stock must be a non-negative number")]
    NegativeStock,
    #[error("At least one image is required")]
    NoImages,
    #[error("Price must be a valid amount with exactly 2 decimal places")]
    InvalidPrice,
}

/// Check a catalog text field (name, slug, category, brand, description).
///
/// # Errors
///
/// Returns [`ProductInputError::TooShort`] naming the field.
pub fn validate_product_text(field: &'static str, value: &str) -> Result<(), ProductInputError> {
    if value.trim().chars().count() < 3 {
        return Err(ProductInputError::TooShort { field });
    }
    Ok(())
}

/// Check a catalog price string: digits, optionally followed by exactly two
/// decimals (`12`, `12.50`).
///
/// # Errors
///
/// Returns [`ProductInputError::InvalidPrice`].
pub fn validate_price_text(value: &str) -> Result<(), ProductInputError> {
    let (whole, cents) = match value.split_once('.') {
        Some((whole, cents)) => (whole, Some(cents)),
        None => (value, None),
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    let ok = digits(whole) && cents.is_none_or(|c| c.len() == 2 && digits(c));
    if ok {
        Ok(())
    } else {
        Err(ProductInputError::InvalidPrice)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_quantity_bounds() {
        assert_eq!(parse_add_quantity("1"), Ok(1));
        assert_eq!(parse_add_quantity(" 99 "), Ok(99));
        assert_eq!(parse_add_quantity("0"), Err(QuantityError::BelowOne));
        assert_eq!(parse_add_quantity("100"), Err(QuantityError::AboveMax));
        assert_eq!(parse_add_quantity("1.5"), Err(QuantityError::NotWholeNumber));
        assert_eq!(parse_add_quantity("abc"), Err(QuantityError::NotWholeNumber));
    }

    #[test]
    fn test_update_quantity_allows_zero() {
        assert_eq!(parse_update_quantity("0"), Ok(0));
        assert_eq!(parse_update_quantity("-1"), Err(QuantityError::Negative));
        assert_eq!(parse_update_quantity("100"), Err(QuantityError::AboveMax));
        assert_eq!(
            QuantityError::Negative.to_string(),
            "Quantity must be 0 or greater"
        );
    }

    #[test]
    fn test_huge_quantity_rejected() {
        assert_eq!(
            parse_update_quantity("99999999999"),
            Err(QuantityError::AboveMax)
        );
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Al  ").unwrap(), "Al");
        assert_eq!(validate_name("A"), Err(AccountError::NameTooShort));
        assert_eq!(validate_name(&"x".repeat(51)), Err(AccountError::NameTooLong));
        assert!(validate_name(&"x".repeat(50)).is_ok());
    }

    #[test]
    fn test_sign_up_valid() {
        let s = SignUp::parse("Jane", " Jane@Example.COM ", "secret1", "secret1").unwrap();
        assert_eq!(s.email.as_str(), "jane@example.com");
        assert_eq!(s.name, "Jane");
    }

    #[test]
    fn test_sign_up_errors_in_field_order() {
        assert_eq!(
            SignUp::parse("J", "bad", "1", "2").unwrap_err(),
            AccountError::NameTooShort
        );
        assert_eq!(
            SignUp::parse("Jane", "bad", "1", "2").unwrap_err(),
            AccountError::InvalidEmail
        );
        assert_eq!(
            SignUp::parse("Jane", "jane@example.com", "12345", "12345").unwrap_err(),
            AccountError::PasswordTooShort
        );
        let err = SignUp::parse("Jane", "jane@example.com", "secret1", "secret2").unwrap_err();
        assert_eq!(err.to_string(), "Passwords do not match");
    }

    #[test]
    fn test_product_text() {
        assert!(validate_product_text("Name", "Polo").is_ok());
        let err = validate_product_text("Brand", "ab").unwrap_err();
        assert_eq!(err.to_string(), "Brand must be at least 3 characters");
    }

    #[test]
    fn test_price_text() {
        assert!(validate_price_text("12").is_ok());
        assert!(validate_price_text("12.50").is_ok());
        assert!(validate_price_text("12.5").is_err());
        assert!(validate_price_text("-1.00").is_err());
        assert!(validate_price_text(".50").is_err());
        assert!(validate_price_text("").is_err());
    }
}
