//! Admin pages. Every handler here takes [`RequireAdmin`], so the
//! authentication guard runs first and the admin guard second.
//!
//! [`RequireAdmin`]: crate::middleware::RequireAdmin

mod dashboard;
mod detail;
mod dialog;
pub mod types;

pub use dashboard::{DashboardRow, DashboardTemplate, index, parse_filter};
pub use detail::{OrderDetailTemplate, show, status_redirect, update_status};
pub use dialog::{NO_CHANGES_MESSAGE, OrderFormTemplate, create, edit, new_order, update};
pub use types::{OrderDialog, OrderView};
