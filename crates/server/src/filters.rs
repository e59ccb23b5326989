//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Turns a phone number as typed into a `tel:` link target.
///
/// Usage in templates: `<a href="{{ order.phone|tel_href }}">`
#[askama::filter_fn]
pub fn tel_href(phone: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(tel_target(&phone.to_string()))
}

fn tel_target(phone: &str) -> String {
    let dialable: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    format!("tel:{dialable}")
}
