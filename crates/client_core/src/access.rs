//! Role and department based visibility checks.
//!
//! Every check takes the current user as `Option<&User>` and fails closed:
//! a missing user, or a user without a role, is never permitted anything.

use shared::domain::{AccessTag, Role, User};

/// Whether `user` may see an entry guarded by `allowed`.
///
/// An empty list admits every signed-in user with a role. Otherwise the
/// user's role or department must appear in the list.
pub fn can_access(user: Option<&User>, allowed: &[AccessTag]) -> bool {
    let Some(user) = user else {
        return false;
    };
    let Some(role) = user.role else {
        return false;
    };
    if allowed.is_empty() {
        return true;
    }
    allowed.iter().any(|tag| match tag {
        AccessTag::Role(r) => *r == role,
        AccessTag::Department(d) => user.department == Some(*d),
    })
}

fn has_role(user: Option<&User>, role: Role) -> bool {
    user.and_then(|u| u.role) == Some(role)
}

pub fn is_admin(user: Option<&User>) -> bool {
    has_role(user, Role::Admin)
}

pub fn is_hod(user: Option<&User>) -> bool {
    has_role(user, Role::Hod)
}

pub fn is_ahod(user: Option<&User>) -> bool {
    has_role(user, Role::Ahod)
}

pub fn is_qc(user: Option<&User>) -> bool {
    has_role(user, Role::Qc)
}

pub fn is_campus_pastor(user: Option<&User>) -> bool {
    has_role(user, Role::CampusPastor)
}

pub fn is_global_pastor(user: Option<&User>) -> bool {
    has_role(user, Role::GlobalPastor)
}

pub fn is_worker(user: Option<&User>) -> bool {
    has_role(user, Role::Worker)
}

/// Approve or decline permission requests raised by workers.
pub fn can_approve(user: Option<&User>) -> bool {
    is_admin(user) || is_hod(user) || is_ahod(user)
}

pub fn can_issue_tickets(user: Option<&User>) -> bool {
    is_admin(user) || is_qc(user) || is_hod(user)
}

pub fn can_view_campus_reports(user: Option<&User>) -> bool {
    is_admin(user) || is_campus_pastor(user) || is_global_pastor(user)
}

pub fn can_view_global_reports(user: Option<&User>) -> bool {
    is_admin(user) || is_global_pastor(user)
}

pub fn can_manage_users(user: Option<&User>) -> bool {
    is_admin(user)
}

pub fn can_assign_roles(user: Option<&User>) -> bool {
    is_admin(user) || is_global_pastor(user)
}

/// Department heads file the weekly service report.
pub fn can_create_reports(user: Option<&User>) -> bool {
    is_admin(user) || is_hod(user) || is_ahod(user)
}

pub fn can_use_special_workflow(user: Option<&User>) -> bool {
    is_admin(user) || user.is_some_and(|u| u.role.is_some() && u.special_workflow_approved)
}

/// Every flag a screen may need, computed once per render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub is_admin: bool,
    pub is_hod: bool,
    pub is_ahod: bool,
    pub is_qc: bool,
    pub is_campus_pastor: bool,
    pub is_global_pastor: bool,
    pub is_worker: bool,
    pub can_approve: bool,
    pub can_issue_tickets: bool,
    pub can_view_campus_reports: bool,
    pub can_view_global_reports: bool,
    pub can_manage_users: bool,
    pub can_assign_roles: bool,
    pub can_create_reports: bool,
    pub can_use_special_workflow: bool,
}

impl Permissions {
    pub fn for_user(user: Option<&User>) -> Self {
        Self {
            is_admin: is_admin(user),
            is_hod: is_hod(user),
            is_ahod: is_ahod(user),
            is_qc: is_qc(user),
            is_campus_pastor: is_campus_pastor(user),
            is_global_pastor: is_global_pastor(user),
            is_worker: is_worker(user),
            can_approve: can_approve(user),
            can_issue_tickets: can_issue_tickets(user),
            can_view_campus_reports: can_view_campus_reports(user),
            can_view_global_reports: can_view_global_reports(user),
            can_manage_users: can_manage_users(user),
            can_assign_roles: can_assign_roles(user),
            can_create_reports: can_create_reports(user),
            can_use_special_workflow: can_use_special_workflow(user),
        }
    }
}

#[cfg(test)]
#[path = "tests/access_tests.rs"]
mod tests;
