//! View pieces shared by every page.

use stitchtrack_core::OrderStatus;

use crate::middleware::CurrentSession;

/// Header state: who is signed in and which links to show.
#[derive(Debug, Clone, Default)]
pub struct NavView {
    pub signed_in: bool,
    pub is_admin: bool,
    /// Profile name, falling back to the account email.
    pub display_name: Option<String>,
}

impl NavView {
    /// Read the current identity once.
    #[must_use]
    pub fn for_session(current: &CurrentSession) -> Self {
        let snapshot = current.identity().snapshot();
        let display_name = snapshot
            .profile
            .as_ref()
            .map(|profile| profile.display_name().to_string())
            .or_else(|| snapshot.user.as_ref().and_then(|user| user.email.clone()));

        Self {
            signed_in: snapshot.is_authenticated(),
            is_admin: snapshot.is_admin(),
            display_name,
        }
    }
}

/// One step of the order progress bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressStep {
    pub label: &'static str,
    pub reached: bool,
}

/// The four status steps, marking those `status` has reached.
#[must_use]
pub fn progress_steps(status: OrderStatus) -> Vec<ProgressStep> {
    OrderStatus::ALL
        .into_iter()
        .map(|step| ProgressStep {
            label: step.label(),
            reached: status.has_reached(step),
        })
        .collect()
}
