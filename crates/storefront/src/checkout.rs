//! Checkout: form validation and pending orders.
//!
//! Everything in here runs before any network call. A form that fails
//! validation never reaches the backend. The registration form lives here
//! too since it shares the field rules.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::info;

use emporium_core::{Email, EmailError, OrderId};

use crate::api::types::{Address, GuestOrderItem, PlaceGuestOrderRequest, RegisterRequest};
use crate::cart::CartLine;
use crate::error::StoreError;
use crate::shop::Shop;

const MIN_ZIPCODE_LEN: usize = 5;
const MIN_PHONE_LEN: usize = 8;
const MIN_PASSWORD_LEN: usize = 8;

/// A form field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("Zip code is required")]
    ZipcodeTooShort,

    #[error("Zip code must contain only numbers")]
    ZipcodeNotNumeric,

    #[error("Phone is required and must be at least 8 digits")]
    PhoneTooShort,

    #[error("Phone number must contain only numbers")]
    PhoneNotNumeric,

    #[error("Invalid email")]
    InvalidEmail(#[source] EmailError),

    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Password must be at least 8 characters and include uppercase, lowercase, and a number")]
    WeakPassword,

    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Check an address against the address form rules.
///
/// # Errors
///
/// Returns the first rule the address breaks.
pub fn validate_address(address: &Address) -> Result<(), ValidationError> {
    require("Recipient name", &address.recipient_name)?;
    require("Street", &address.street)?;
    require("City", &address.city)?;
    require("State", &address.state)?;

    if address.zipcode.chars().count() < MIN_ZIPCODE_LEN {
        return Err(ValidationError::ZipcodeTooShort);
    }
    if !is_digits(&address.zipcode) {
        return Err(ValidationError::ZipcodeNotNumeric);
    }

    require("Country", &address.country)?;

    if address.phone.chars().count() < MIN_PHONE_LEN {
        return Err(ValidationError::PhoneTooShort);
    }
    if !is_digits(&address.phone) {
        return Err(ValidationError::PhoneNotNumeric);
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn is_digits(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Registration
// =============================================================================

/// Account registration form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Registration {
    /// Validate the form and build the registration request.
    ///
    /// # Errors
    ///
    /// Returns the first rule the form breaks.
    pub fn into_request(self) -> Result<RegisterRequest, ValidationError> {
        validate_registration(&self)?;
        let email = Email::parse(&self.email).map_err(ValidationError::InvalidEmail)?;
        Ok(RegisterRequest {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email,
            password: self.password,
        })
    }
}

/// Check a registration form against the sign-up rules.
///
/// # Errors
///
/// Returns the first rule the form breaks.
pub fn validate_registration(form: &Registration) -> Result<(), ValidationError> {
    require("First name", &form.first_name)?;
    require("Last name", &form.last_name)?;
    Email::parse(&form.email).map_err(ValidationError::InvalidEmail)?;
    if !is_strong_password(form.password.expose_secret()) {
        return Err(ValidationError::WeakPassword);
    }
    if form.password.expose_secret() != form.confirm_password.expose_secret() {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// At least eight characters with a lowercase letter, an uppercase letter
/// and a digit.
fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_lowercase)
        && password.chars().any(char::is_uppercase)
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Guest checkout form.
#[derive(Debug, Clone)]
pub struct GuestCheckout {
    pub email: String,
    pub shipping_address: Address,
    /// `None` bills to the shipping address.
    pub billing_address: Option<Address>,
}

impl GuestCheckout {
    /// Validate the form and build the order request from the cart lines.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` if the email or either address is invalid,
    /// or the cart is empty.
    pub fn into_request(self, lines: &[CartLine]) -> Result<PlaceGuestOrderRequest, ValidationError> {
        let guest_email = Email::parse(&self.email).map_err(ValidationError::InvalidEmail)?;
        validate_address(&self.shipping_address)?;
        let billing_address = match self.billing_address {
            Some(billing) => {
                validate_address(&billing)?;
                billing
            }
            None => self.shipping_address.clone(),
        };
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        Ok(PlaceGuestOrderRequest {
            guest_email,
            shipping_address: self.shipping_address,
            billing_address,
            items: lines.iter().map(GuestOrderItem::from).collect(),
        })
    }
}

/// An order awaiting payment.
///
/// Lives only as long as the checkout; nothing about it is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    pub order_id: OrderId,
    pub client_secret: String,
}

impl PendingOrder {
    #[must_use]
    pub const fn new(order_id: OrderId, client_secret: String) -> Self {
        Self {
            order_id,
            client_secret,
        }
    }

    /// Record that the payment went through and empty the local cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the emptied cart cannot be persisted.
    pub fn confirm_paid(self, shop: &Shop) -> Result<OrderId, StoreError> {
        shop.state().clear_cart()?;
        info!(order_id = %self.order_id, "Payment confirmed, cart cleared");
        Ok(self.order_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::tests::product;

    fn address() -> Address {
        Address {
            id: None,
            recipient_name: "Ada".to_string(),
            street: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zipcode: "62701".to_string(),
            country: "US".to_string(),
            phone: "5551234567".to_string(),
            default_shipping: false,
            default_billing: false,
        }
    }

    fn line() -> CartLine {
        let mut cart = crate::cart::Cart::default();
        cart.add(&product(1, 5).with_quantity(2)).unwrap();
        cart.lines()[0].clone()
    }

    #[test]
    fn test_valid_address() {
        assert_eq!(validate_address(&address()), Ok(()));
    }

    fn validate_with(mutate: impl FnOnce(&mut Address)) -> Result<(), ValidationError> {
        let mut a = address();
        mutate(&mut a);
        validate_address(&a)
    }

    #[test]
    fn test_address_rules() {
        assert_eq!(
            validate_with(|a| a.recipient_name = "  ".to_string()),
            Err(ValidationError::Required {
                field: "Recipient name"
            })
        );
        assert_eq!(
            validate_with(|a| a.city.clear()),
            Err(ValidationError::Required { field: "City" })
        );
        assert_eq!(
            validate_with(|a| a.zipcode = "1234".to_string()),
            Err(ValidationError::ZipcodeTooShort)
        );
        assert_eq!(
            validate_with(|a| a.zipcode = "1234A".to_string()),
            Err(ValidationError::ZipcodeNotNumeric)
        );
        assert_eq!(
            validate_with(|a| a.phone = "555123".to_string()),
            Err(ValidationError::PhoneTooShort)
        );
        assert_eq!(
            validate_with(|a| a.phone = "555-123-4567".to_string()),
            Err(ValidationError::PhoneNotNumeric)
        );
    }

    #[test]
    fn test_guest_request_bills_to_shipping_by_default() {
        let form = GuestCheckout {
            email: "guest@example.com".to_string(),
            shipping_address: address(),
            billing_address: None,
        };

        let request = form.into_request(&[line()]).unwrap();

        assert_eq!(request.guest_email.as_str(), "guest@example.com");
        assert_eq!(request.billing_address, request.shipping_address);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].quantity, 2);
        assert_eq!(request.items[0].total_price, request.items[0].unit_price.times(2));
    }

    #[test]
    fn test_guest_request_rejects_bad_input() {
        let bad_email = GuestCheckout {
            email: "not-an-email".to_string(),
            shipping_address: address(),
            billing_address: None,
        };
        assert!(matches!(
            bad_email.into_request(&[line()]),
            Err(ValidationError::InvalidEmail(_))
        ));

        let empty_cart = GuestCheckout {
            email: "guest@example.com".to_string(),
            shipping_address: address(),
            billing_address: None,
        };
        assert_eq!(
            empty_cart.into_request(&[]),
            Err(ValidationError::EmptyCart)
        );

        let mut billing = address();
        billing.phone = "12".to_string();
        let bad_billing = GuestCheckout {
            email: "guest@example.com".to_string(),
            shipping_address: address(),
            billing_address: Some(billing),
        };
        assert_eq!(
            bad_billing.into_request(&[line()]),
            Err(ValidationError::PhoneTooShort)
        );
    }

    fn registration(password: &str, confirm: &str) -> Registration {
        Registration {
            first_name: " Grace ".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
        }
    }

    #[test]
    fn test_registration_builds_trimmed_request() {
        let request = registration("Cobol1959", "Cobol1959").into_request().unwrap();

        assert_eq!(request.first_name, "Grace");
        assert_eq!(request.email.as_str(), "grace@example.com");
        assert_eq!(request.password.expose_secret(), "Cobol1959");
    }

    #[test]
    fn test_registration_rules() {
        let reject = |form: Registration| validate_registration(&form).unwrap_err();

        let mut form = registration("Cobol1959", "Cobol1959");
        form.last_name = " ".to_string();
        assert_eq!(reject(form), ValidationError::Required { field: "Last name" });

        let mut form = registration("Cobol1959", "Cobol1959");
        form.email = "grace".to_string();
        assert!(matches!(reject(form), ValidationError::InvalidEmail(_)));

        for weak in ["Cob1", "cobol1959", "COBOL1959", "CobolCobol"] {
            assert_eq!(reject(registration(weak, weak)), ValidationError::WeakPassword);
        }
        assert_eq!(
            reject(registration("Cobol1959", "Cobol1960")),
            ValidationError::PasswordMismatch
        );
    }
}
