//! Shipping address with checkout validation rules.

use serde::{Deserialize, Serialize};

/// Validation failure for a [`ShippingAddress`]. Messages are user-facing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Full name must be at least 2 characters")]
    FullNameTooShort,
    #[error("Full name must be less than 100 characters")]
    FullNameTooLong,
    #[error("Address must be at least 5 characters")]
    AddressTooShort,
    #[error("Address must be less than 200 characters")]
    AddressTooLong,
    #[error("City must be at least 2 characters")]
    CityTooShort,
    #[error("City must be less than 100 characters")]
    CityTooLong,
    #[error("State must be exactly 2 characters (e.g., CA, NY)")]
    StateLength,
    #[error("Postal code must be at least 5 characters")]
    PostalCodeTooShort,
    #[error("Postal code must be less than 10 characters")]
    PostalCodeTooLong,
    #[error("Postal code must be alphanumeric")]
    PostalCodeCharacters,
    #[error("Country must be at least 2 characters")]
    CountryTooShort,
}

/// A delivery address.
///
/// Saved on the user as JSON during checkout and copied onto each order, so
/// later edits never change historical orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

/// Country used when the form leaves it blank.
pub const DEFAULT_COUNTRY: &str = "US";

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

impl ShippingAddress {
    /// Build an address from raw form input, trimming every field and
    /// defaulting a blank country, then validate it.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input violates.
    pub fn parse(
        full_name: &str,
        address: &str,
        city: &str,
        state: &str,
        postal_code: &str,
        country: &str,
    ) -> Result<Self, AddressError> {
        let country = country.trim();
        let parsed = Self {
            full_name: full_name.trim().to_owned(),
            address: address.trim().to_owned(),
            city: city.trim().to_owned(),
            state: state.trim().to_owned(),
            postal_code: postal_code.trim().to_owned(),
            country: if country.is_empty() {
                default_country()
            } else {
                country.to_owned()
            },
        };
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check every field, reporting the first violation in form order.
    ///
    /// # Errors
    ///
    /// Returns the first rule the address violates.
    pub fn validate(&self) -> Result<(), AddressError> {
        check_len(
            &self.full_name,
            2,
            100,
            AddressError::FullNameTooShort,
            AddressError::FullNameTooLong,
        )?;
        check_len(
            &self.address,
            5,
            200,
            AddressError::AddressTooShort,
            AddressError::AddressTooLong,
        )?;
        check_len(
            &self.city,
            2,
            100,
            AddressError::CityTooShort,
            AddressError::CityTooLong,
        )?;
        if self.state.chars().count() != 2 {
            return Err(AddressError::StateLength);
        }
        check_len(
            &self.postal_code,
            5,
            10,
            AddressError::PostalCodeTooShort,
            AddressError::PostalCodeTooLong,
        )?;
        if !self
            .postal_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-')
        {
            return Err(AddressError::PostalCodeCharacters);
        }
        if self.country.chars().count() < 2 {
            return Err(AddressError::CountryTooShort);
        }
        Ok(())
    }

    /// Whether the address passes validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn check_len(
    value: &str,
    min: usize,
    max: usize,
    too_short: AddressError,
    too_long: AddressError,
) -> Result<(), AddressError> {
    let len = value.chars().count();
    if len < min {
        Err(too_short)
    } else if len > max {
        Err(too_long)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> ShippingAddress {
        ShippingAddress::parse("Jane Doe", "123 Main St", "Springfield", "IL", "62701", "US")
            .unwrap()
    }

    #[test]
    fn test_valid_address() {
        assert!(valid().is_valid());
    }

    #[test]
    fn test_blank_country_defaults_to_us() {
        let addr =
            ShippingAddress::parse("Jane Doe", "123 Main St", "Springfield", "IL", "62701", "  ")
                .unwrap();
        assert_eq!(addr.country, "US");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let addr = ShippingAddress::parse(
            "  Jane Doe ",
            "123 Main St",
            "Springfield",
            " IL ",
            "62701",
            "US",
        )
        .unwrap();
        assert_eq!(addr.full_name, "Jane Doe");
        assert_eq!(addr.state, "IL");
    }

    #[test]
    fn test_first_violation_reported() {
        let err = ShippingAddress::parse("J", "1", "X", "Illinois", "!", "U").unwrap_err();
        assert_eq!(err, AddressError::FullNameTooShort);
        assert_eq!(err.to_string(), "Full name must be at least 2 characters");
    }

    #[test]
    fn test_state_must_be_two_characters() {
        let mut addr = valid();
        addr.state = "CAL".into();
        assert_eq!(addr.validate(), Err(AddressError::StateLength));
        addr.state = "C".into();
        assert_eq!(addr.validate(), Err(AddressError::StateLength));
    }

    #[test]
    fn test_postal_code_rules() {
        let mut addr = valid();
        addr.postal_code = "1234".into();
        assert_eq!(addr.validate(), Err(AddressError::PostalCodeTooShort));

        addr.postal_code = "12345678901".into();
        assert_eq!(addr.validate(), Err(AddressError::PostalCodeTooLong));

        addr.postal_code = "12345#".into();
        assert_eq!(addr.validate(), Err(AddressError::PostalCodeCharacters));

        addr.postal_code = "SW1A 1AA".into();
        assert!(addr.is_valid());

        addr.postal_code = "12345-6789".into();
        assert!(addr.is_valid());
    }

    #[test]
    fn test_length_limits() {
        let mut addr = valid();
        addr.address = "a".repeat(201);
        assert_eq!(addr.validate(), Err(AddressError::AddressTooLong));

        let mut addr = valid();
        addr.city = "c".repeat(101);
        assert_eq!(addr.validate(), Err(AddressError::CityTooLong));
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(valid()).unwrap();
        assert_eq!(json["fullName"], "Jane Doe");
        assert_eq!(json["postalCode"], "62701");

        let without_country = serde_json::json!({
            "fullName": "Jane Doe",
            "address": "123 Main St",
            "city": "Springfield",
            "state": "IL",
            "postalCode": "62701"
        });
        let parsed: ShippingAddress = serde_json::from_value(without_country).unwrap();
        assert_eq!(parsed.country, "US");
    }
}
