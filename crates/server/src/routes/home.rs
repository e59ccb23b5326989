//! Home page.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::CurrentSession;

use super::layout::NavView;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    /// Target of the "Admin" entry.
    pub admin_href: &'static str,
}

/// Where the "Admin" entry leads for this visitor.
#[must_use]
pub const fn admin_href(is_authenticated: bool) -> &'static str {
    if is_authenticated { "/admin" } else { "/login" }
}

/// Display the home page.
pub async fn home(current: CurrentSession) -> HomeTemplate {
    let nav = NavView::for_session(&current);
    HomeTemplate {
        admin_href: admin_href(nav.signed_in),
        flash: current.take_flash().await,
        nav,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_href() {
        assert_eq!(admin_href(false), "/login");
        assert_eq!(admin_href(true), "/admin");
    }
}
