//! Customer value objects.
//!
//! Every type here is immutable, compared by value, and can only be built
//! through its validating `create` (deserialization included).

use serde::{Deserialize, Serialize};

use crmsync_core::{DomainError, DomainResult, ValueObject};

pub const CUSTOMER_NAME_MAX_LEN: usize = 200;
pub const EMAIL_MAX_LEN: usize = 254;
pub const ACCOUNT_NUMBER_MAX_LEN: usize = 50;
pub const METER_NUMBER_MAX_LEN: usize = 50;
const PHONE_MIN_DIGITS: usize = 10;
const PHONE_MAX_DIGITS: usize = 15;

/// Error codes raised by the value objects in this module.
pub mod errors {
    use crmsync_core::DomainError;

    pub const CUSTOMER_NAME_EMPTY: &str = "CustomerName.Empty";
    pub const CUSTOMER_NAME_TOO_LONG: &str = "CustomerName.TooLong";
    pub const EMAIL_EMPTY: &str = "Email.Empty";
    pub const EMAIL_TOO_LONG: &str = "Email.TooLong";
    pub const EMAIL_INVALID_FORMAT: &str = "Email.InvalidFormat";
    pub const PHONE_EMPTY: &str = "PhoneNumber.Empty";
    pub const PHONE_INVALID_FORMAT: &str = "PhoneNumber.InvalidFormat";
    pub const ADDRESS_STREET_REQUIRED: &str = "Address.StreetRequired";
    pub const ADDRESS_CITY_REQUIRED: &str = "Address.CityRequired";
    pub const ADDRESS_STATE_REQUIRED: &str = "Address.StateRequired";
    pub const ADDRESS_POSTAL_CODE_REQUIRED: &str = "Address.PostalCodeRequired";
    pub const ACCOUNT_NUMBER_EMPTY: &str = "AccountNumber.Empty";
    pub const ACCOUNT_NUMBER_TOO_LONG: &str = "AccountNumber.TooLong";
    pub const ACCOUNT_NUMBER_INVALID_FORMAT: &str = "AccountNumber.InvalidFormat";
    pub const METER_NUMBER_EMPTY: &str = "MeterNumber.Empty";
    pub const METER_NUMBER_TOO_LONG: &str = "MeterNumber.TooLong";

    pub(crate) fn required(code: &'static str, what: &str) -> DomainError {
        DomainError::new(code, format!("{what} is required"))
    }

    pub(crate) fn too_long(code: &'static str, what: &str, max: usize) -> DomainError {
        DomainError::new(code, format!("{what} must be at most {max} characters"))
    }

    pub(crate) fn invalid(code: &'static str, what: &str, value: &str) -> DomainError {
        DomainError::new(code, format!("'{value}' is not a valid {what}"))
    }
}

/// Shared plumbing for single-string value objects.
macro_rules! string_value_object {
    ($t:ident) => {
        impl $t {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ValueObject for $t {}

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::create(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::create(&value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

fn non_blank<'a>(value: &'a str, code: &'static str, what: &str) -> DomainResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(errors::required(code, what));
    }
    Ok(trimmed)
}

fn within(value: &str, max: usize, code: &'static str, what: &str) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(errors::too_long(code, what, max));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// CustomerName
// ─────────────────────────────────────────────────────────────────────────────

/// Display name of a customer (trimmed, 1..=200 characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerName(String);

impl CustomerName {
    pub fn create(value: &str) -> DomainResult<Self> {
        let name = non_blank(value, errors::CUSTOMER_NAME_EMPTY, "customer name")?;
        within(name, CUSTOMER_NAME_MAX_LEN, errors::CUSTOMER_NAME_TOO_LONG, "customer name")?;
        Ok(Self(name.to_string()))
    }
}

string_value_object!(CustomerName);

// ─────────────────────────────────────────────────────────────────────────────
// EmailAddress
// ─────────────────────────────────────────────────────────────────────────────

/// Email address, normalized to lower case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn create(value: &str) -> DomainResult<Self> {
        let email = non_blank(value, errors::EMAIL_EMPTY, "email")?.to_lowercase();
        // Lower-casing can lengthen some characters, so measure what is stored.
        within(&email, EMAIL_MAX_LEN, errors::EMAIL_TOO_LONG, "email")?;
        if !Self::is_well_formed(&email) {
            return Err(errors::invalid(errors::EMAIL_INVALID_FORMAT, "email address", &email));
        }
        Ok(Self(email))
    }

    /// `local@domain.tld`: one `@`, no whitespace, and a dot inside the domain.
    fn is_well_formed(email: &str) -> bool {
        if email.chars().any(char::is_whitespace) {
            return false;
        }
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };
        if local.is_empty() || domain.contains('@') {
            return false;
        }
        match domain.rfind('.') {
            Some(dot) => dot > 0 && dot + 1 < domain.len() && !domain.starts_with('.'),
            None => false,
        }
    }

    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or("", |(local, _)| local)
    }

    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

string_value_object!(EmailAddress);

// ─────────────────────────────────────────────────────────────────────────────
// PhoneNumber
// ─────────────────────────────────────────────────────────────────────────────

/// Phone number as entered (trimmed); 10 to 15 digits, common separators allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn create(value: &str) -> DomainResult<Self> {
        let phone = non_blank(value, errors::PHONE_EMPTY, "phone number")?;

        let body = phone.strip_prefix('+').unwrap_or(phone);
        let allowed = body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'));
        let digits = body.chars().filter(char::is_ascii_digit).count();

        if !allowed || !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits) {
            return Err(errors::invalid(errors::PHONE_INVALID_FORMAT, "phone number", phone));
        }
        Ok(Self(phone.to_string()))
    }

    /// Digits only (no separators, no leading `+`).
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }
}

string_value_object!(PhoneNumber);

// ─────────────────────────────────────────────────────────────────────────────
// Address
// ─────────────────────────────────────────────────────────────────────────────

/// Postal address (customer mailing address or utility service address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAddress")]
pub struct Address {
    street: String,
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
}

#[derive(Deserialize)]
struct RawAddress {
    street: String,
    #[serde(default)]
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
}

impl TryFrom<RawAddress> for Address {
    type Error = DomainError;

    fn try_from(raw: RawAddress) -> Result<Self, Self::Error> {
        let address = Address::create(&raw.street, &raw.city, &raw.state, &raw.postal_code)?;
        Ok(match raw.line2 {
            Some(line2) => address.with_line2(&line2),
            None => address,
        })
    }
}

impl Address {
    pub fn create(street: &str, city: &str, state: &str, postal_code: &str) -> DomainResult<Self> {
        let street = non_blank(street, errors::ADDRESS_STREET_REQUIRED, "street")?;
        let city = non_blank(city, errors::ADDRESS_CITY_REQUIRED, "city")?;
        let state = non_blank(state, errors::ADDRESS_STATE_REQUIRED, "state")?;
        let postal_code = non_blank(postal_code, errors::ADDRESS_POSTAL_CODE_REQUIRED, "postal code")?;

        Ok(Self {
            street: street.to_string(),
            line2: None,
            city: city.to_string(),
            state: state.to_string(),
            postal_code: postal_code.to_string(),
        })
    }

    /// Copy with a second address line (blank clears it).
    pub fn with_line2(&self, line2: &str) -> Self {
        let line2 = line2.trim();
        Self {
            line2: (!line2.is_empty()).then(|| line2.to_string()),
            ..self.clone()
        }
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn line2(&self) -> Option<&str> {
        self.line2.as_deref()
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn postal_code(&self) -> &str {
        &self.postal_code
    }
}

impl ValueObject for Address {}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.street)?;
        if let Some(line2) = &self.line2 {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {}, {} {}", self.city, self.state, self.postal_code)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AccountNumber / MeterNumber
// ─────────────────────────────────────────────────────────────────────────────

/// Utility account number (upper-cased; ASCII letters, digits and `-`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn create(value: &str) -> DomainResult<Self> {
        let number = non_blank(value, errors::ACCOUNT_NUMBER_EMPTY, "account number")?;
        within(number, ACCOUNT_NUMBER_MAX_LEN, errors::ACCOUNT_NUMBER_TOO_LONG, "account number")?;
        if !number.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(errors::invalid(
                errors::ACCOUNT_NUMBER_INVALID_FORMAT,
                "account number",
                number,
            ));
        }
        Ok(Self(number.to_ascii_uppercase()))
    }
}

string_value_object!(AccountNumber);

/// Utility meter number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeterNumber(String);

impl MeterNumber {
    pub fn create(value: &str) -> DomainResult<Self> {
        let number = non_blank(value, errors::METER_NUMBER_EMPTY, "meter number")?;
        within(number, METER_NUMBER_MAX_LEN, errors::METER_NUMBER_TOO_LONG, "meter number")?;
        Ok(Self(number.to_string()))
    }
}

string_value_object!(MeterNumber);
