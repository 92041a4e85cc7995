//! The application's page table.
//!
//! Public pages render for everyone. Each dashboard section is restricted
//! to one role. Any path not in the table redirects to `/`.

use haven_core::roles::ROOT_PATH;
use haven_core::Role;

use crate::guard::{guard, GuardDecision};
use crate::store::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Path pattern; a `:name` segment matches any single segment.
    pub pattern: &'static str,
    pub page: &'static str,
    /// `None` for public pages.
    pub roles: Option<&'static [Role]>,
}

const ADMIN: Option<&[Role]> = Some(&[Role::Admin]);
const DOCTOR: Option<&[Role]> = Some(&[Role::Doctor]);
const PATIENT: Option<&[Role]> = Some(&[Role::Patient]);

const fn public(pattern: &'static str, page: &'static str) -> Route {
    Route {
        pattern,
        page,
        roles: None,
    }
}

const fn restricted(
    pattern: &'static str,
    page: &'static str,
    roles: Option<&'static [Role]>,
) -> Route {
    Route {
        pattern,
        page,
        roles,
    }
}

pub static ROUTES: &[Route] = &[
    public("/", "landing"),
    public("/login", "login"),
    public("/register", "register"),
    public("/forgot-password", "forgot-password"),
    public("/reset-password", "reset-password"),
    public("/donate", "donor-portal"),
    public("/about", "about-us"),
    public("/contact", "contact-us"),
    public("/privacy-policy", "privacy-policy"),
    public("/events/:id", "event-detail"),
    restricted("/admin", "admin-dashboard", ADMIN),
    restricted("/admin/users", "user-management", ADMIN),
    restricted("/admin/rehab-centers", "rehab-centers", ADMIN),
    restricted("/admin/addiction-types", "addiction-types", ADMIN),
    restricted("/admin/donations", "donations-management", ADMIN),
    restricted("/admin/payment-settings", "payment-settings", ADMIN),
    restricted("/admin/smtp-settings", "smtp-settings", ADMIN),
    restricted("/admin/audit-logs", "audit-logs", ADMIN),
    restricted("/admin/profile", "admin-profile", ADMIN),
    restricted("/admin/site-settings", "site-settings", ADMIN),
    restricted("/doctor", "doctor-dashboard", DOCTOR),
    restricted("/doctor/profile", "doctor-profile", DOCTOR),
    restricted("/doctor/requests", "patient-requests", DOCTOR),
    restricted("/doctor/notes", "patient-requests", DOCTOR),
    restricted("/patient", "patient-dashboard", PATIENT),
    restricted("/patient/profile", "patient-profile", PATIENT),
    restricted("/patient/choose-doctor", "choose-doctor", PATIENT),
    restricted("/patient/treatment", "treatment-status", PATIENT),
    restricted("/patient/donations", "patient-donations", PATIENT),
];

impl Route {
    fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(self.pattern);
        let mut actual = segments(path);
        loop {
            match (pattern.next(), actual.next()) {
                (None, None) => return true,
                (Some(p), Some(a)) if p.starts_with(':') || p == a => continue,
                _ => return false,
            }
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Find the route for `path`. Query strings and fragments are ignored, as
/// is a trailing slash.
pub fn resolve(path: &str) -> Option<&'static Route> {
    let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    ROUTES.iter().find(|route| route.matches(path))
}

/// Full navigation decision: unknown paths go to `/`, public pages always
/// render, restricted pages go through [`guard`].
pub fn navigate(session: &SessionSnapshot, path: &str) -> GuardDecision {
    match resolve(path) {
        None => GuardDecision::Redirect {
            to: ROOT_PATH,
            replace: true,
        },
        Some(Route { roles: None, .. }) => GuardDecision::Render,
        Some(route) => guard(session, route.roles),
    }
}
