//! Role-based route guard.
//!
//! [`guard`] is a pure function of the session snapshot: it never touches
//! the network and is re-evaluated on every navigation.

use haven_core::roles::{home_path_for, LOGIN_PATH};
use haven_core::Role;

use crate::store::SessionSnapshot;

/// What to do with a request to render a guarded page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session still revalidating: show a neutral loading indicator.
    Loading,
    /// Go elsewhere. `replace` keeps the refused page out of history so
    /// going back does not land on it again.
    Redirect { to: &'static str, replace: bool },
    Render,
}

impl GuardDecision {
    fn redirect(to: &'static str) -> Self {
        GuardDecision::Redirect { to, replace: true }
    }
}

/// Decide whether `session` may see a page restricted to `required` roles.
/// `None` admits any authenticated user.
///
/// ```
/// use haven_core::Role;
/// use haven_session::guard::{guard, GuardDecision};
/// use haven_session::SessionSnapshot;
///
/// let anonymous = SessionSnapshot::default();
/// assert_eq!(
///     guard(&anonymous, Some(&[Role::Admin])),
///     GuardDecision::Redirect { to: "/login", replace: true },
/// );
/// ```
pub fn guard(session: &SessionSnapshot, required: Option<&[Role]>) -> GuardDecision {
    if session.loading {
        return GuardDecision::Loading;
    }
    if !session.is_authenticated() {
        return GuardDecision::redirect(LOGIN_PATH);
    }
    match (required, session.role()) {
        (Some(allowed), Some(role)) if allowed.contains(&role) => GuardDecision::Render,
        (Some(_), role) => GuardDecision::redirect(home_path_for(role)),
        (None, _) => GuardDecision::Render,
    }
}
