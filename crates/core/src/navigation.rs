//! Per-role dashboard navigation menus.

use crate::roles::Role;

/// One entry of a role's dashboard menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub label: &'static str,
    pub path: &'static str,
}

const fn item(label: &'static str, path: &'static str) -> MenuItem {
    MenuItem { label, path }
}

const ADMIN_MENU: &[MenuItem] = &[
    item("Dashboard", "/admin"),
    item("User Management", "/admin/users"),
    item("Rehab Centers", "/admin/rehab-centers"),
    item("Addiction Types", "/admin/addiction-types"),
    item("Donations", "/admin/donations"),
    item("Payment Settings", "/admin/payment-settings"),
    item("SMTP Settings", "/admin/smtp-settings"),
    item("Audit Logs", "/admin/audit-logs"),
    item("My Profile", "/admin/profile"),
];

const DOCTOR_MENU: &[MenuItem] = &[
    item("Dashboard", "/doctor"),
    item("My Profile", "/doctor/profile"),
    item("Patient Requests", "/doctor/requests"),
    item("Treatment Notes", "/doctor/notes"),
];

const PATIENT_MENU: &[MenuItem] = &[
    item("Dashboard", "/patient"),
    item("My Profile", "/patient/profile"),
    item("Choose Doctor", "/patient/choose-doctor"),
    item("Treatment Status", "/patient/treatment"),
    item("My Donations", "/patient/donations"),
];

/// Sidebar entries shown to a signed-in user of the given role.
pub fn menu_for(role: Role) -> &'static [MenuItem] {
    match role {
        Role::Admin => ADMIN_MENU,
        Role::Doctor => DOCTOR_MENU,
        Role::Patient => PATIENT_MENU,
    }
}

/// Whether `item_path` should be highlighted while viewing `current_path`.
///
/// The dashboard root only matches exactly, otherwise it would light up on
/// every page of the section.
pub fn is_active(role: Role, item_path: &str, current_path: &str) -> bool {
    if item_path == role.home_path() {
        current_path == item_path
    } else {
        current_path.starts_with(item_path)
    }
}
