//! Per-field form validation.
//!
//! Validation runs before anything is dispatched; a form that fails never
//! reaches the backend and its messages are rendered next to the fields.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::order::NewOrder;
use crate::types::{Email, OrderStatus, Phone};

/// Minimum length of the customer name and fabric description.
pub const MIN_TEXT_LENGTH: usize = 2;

/// Minimum password length accepted by the login form.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Validation messages keyed by form field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    /// Record a message for `field`. The first message per field wins.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over `(field, message)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Raw order form input as submitted by the create and edit dialogs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fabric: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderForm {
    /// Validate every field and build a [`NewOrder`].
    ///
    /// # Errors
    ///
    /// Returns all field messages at once so the form can show them together.
    pub fn validate(&self) -> Result<NewOrder, FieldErrors> {
        let mut errors = FieldErrors::default();

        let customer_name = required_text(
            &self.customer_name,
            "customer_name",
            "Customer name",
            &mut errors,
        );
        let fabric = required_text(&self.fabric, "fabric", "Fabric", &mut errors);

        let phone = match Phone::parse(self.phone.trim()) {
            Ok(phone) => Some(phone),
            Err(crate::PhoneError::Empty) => {
                errors.add("phone", "Phone is required");
                None
            }
            Err(crate::PhoneError::InvalidCharacter(_)) => {
                errors.add("phone", "Enter a valid phone number");
                None
            }
        };

        let email = match non_blank(self.email.as_deref()) {
            Some(raw) => match Email::parse(raw) {
                Ok(email) => Some(email),
                Err(_) => {
                    errors.add("email", "Enter a valid email address");
                    None
                }
            },
            None => None,
        };

        let requested_status = match non_blank(self.status.as_deref()) {
            Some(raw) => match raw.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", "Choose a valid status");
                    None
                }
            },
            None => None,
        };

        match (customer_name, phone, fabric) {
            (Some(customer_name), Some(phone), Some(fabric)) if errors.is_empty() => Ok(NewOrder {
                customer_name,
                phone,
                email,
                fabric,
                notes: non_blank(self.notes.as_deref()).map(str::to_owned),
                requested_status,
            }),
            _ => Err(errors),
        }
    }
}

/// Raw login form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Check the email shape and password length before calling the backend.
    ///
    /// # Errors
    ///
    /// Returns field messages for `email` and/or `password`.
    pub fn validate(&self) -> Result<Email, FieldErrors> {
        let mut errors = FieldErrors::default();

        let email = if self.email.trim().is_empty() {
            errors.add("email", "Email is required");
            None
        } else {
            Email::parse(self.email.trim())
                .map_err(|_| errors.add("email", "Enter a valid email address"))
                .ok()
        };

        if self.password.is_empty() {
            errors.add("password", "Password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LENGTH} characters"),
            );
        }

        match email {
            Some(email) if errors.is_empty() => Ok(email),
            _ => Err(errors),
        }
    }
}

fn required_text(
    raw: &str,
    field: &'static str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
        return None;
    }
    if value.chars().count() < MIN_TEXT_LENGTH {
        errors.add(
            field,
            format!("{label} must be at least {MIN_TEXT_LENGTH} characters"),
        );
        return None;
    }
    Some(value.to_owned())
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, phone: &str, fabric: &str) -> OrderForm {
        OrderForm {
            customer_name: name.to_string(),
            phone: phone.to_string(),
            fabric: fabric.to_string(),
            ..OrderForm::default()
        }
    }

    #[test]
    fn test_valid_minimal_order() {
        let order = form("Asha", "555-1234", "Silk").validate().unwrap();
        assert_eq!(order.customer_name, "Asha");
        assert_eq!(order.phone.as_str(), "555-1234");
        assert_eq!(order.email, None);
        assert_eq!(order.notes, None);
        assert_eq!(order.requested_status, None);
    }

    #[test]
    fn test_collects_every_field_error() {
        let errors = form("A", "call me", "").validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.get("customer_name"),
            Some("Customer name must be at least 2 characters")
        );
        assert_eq!(errors.get("phone"), Some("Enter a valid phone number"));
        assert_eq!(errors.get("fabric"), Some("Fabric is required"));
    }

    #[test]
    fn test_blank_optional_fields_are_none() {
        let mut input = form("Asha", "555-1234", "Silk");
        input.email = Some("   ".to_string());
        input.notes = Some(String::new());
        let order = input.validate().unwrap();
        assert_eq!(order.email, None);
        assert_eq!(order.notes, None);
    }

    #[test]
    fn test_invalid_email_when_present() {
        let mut input = form("Asha", "555-1234", "Silk");
        input.email = Some("asha-at-example".to_string());
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
    }

    #[test]
    fn test_requested_status_is_parsed() {
        let mut input = form("Asha", "555-1234", "Silk");
        input.status = Some("paid".to_string());
        let order = input.validate().unwrap();
        assert_eq!(order.requested_status, Some(OrderStatus::Paid));

        input.status = Some("lost".to_string());
        assert!(input.validate().unwrap_err().get("status").is_some());
    }

    #[test]
    fn test_login_form_rules() {
        let ok = LoginForm {
            email: "admin@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert_eq!(ok.validate().unwrap().as_str(), "admin@example.com");

        let bad = LoginForm {
            email: "nope".to_string(),
            password: "123".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.get("email"), Some("Enter a valid email address"));
        assert_eq!(
            errors.get("password"),
            Some("Password must be at least 6 characters")
        );
    }
}
