//! Static navigation tree and its per-user view.

use std::collections::HashSet;

use serde::Serialize;
use shared::domain::{AccessTag, Department, Role, User};
use thiserror::Error;

use crate::access::can_access;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub name: String,
    pub title: String,
    pub allowed: Vec<AccessTag>,
    pub in_menu: bool,
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            allowed: Vec::new(),
            in_menu: true,
            children: Vec::new(),
        }
    }

    pub fn allow(mut self, tags: impl IntoIterator<Item = AccessTag>) -> Self {
        self.allowed.extend(tags);
        self
    }

    pub fn hidden_from_menu(mut self) -> Self {
        self.in_menu = false;
        self
    }

    pub fn child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTreeError {
    #[error("duplicate route name: {0}")]
    DuplicateName(String),
    #[error("route name must not be empty")]
    EmptyName,
}

/// Route visible to a particular user. Children are already filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VisibleRoute {
    pub name: String,
    pub title: String,
    pub in_menu: bool,
    pub children: Vec<VisibleRoute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub name: String,
    pub title: String,
    pub depth: usize,
}

#[derive(Debug, Clone)]
pub struct RouteTree {
    roots: Vec<RouteDefinition>,
}

impl RouteTree {
    /// Builds the tree, rejecting empty or repeated names.
    pub fn new(roots: Vec<RouteDefinition>) -> Result<Self, RouteTreeError> {
        let mut seen = HashSet::new();
        let mut stack: Vec<&RouteDefinition> = roots.iter().collect();
        while let Some(route) = stack.pop() {
            if route.name.is_empty() {
                return Err(RouteTreeError::EmptyName);
            }
            if !seen.insert(route.name.as_str()) {
                return Err(RouteTreeError::DuplicateName(route.name.clone()));
            }
            stack.extend(route.children.iter());
        }
        Ok(Self { roots })
    }

    pub fn roots(&self) -> &[RouteDefinition] {
        &self.roots
    }

    pub fn find(&self, name: &str) -> Option<&RouteDefinition> {
        self.path_to(name).and_then(|path| path.last().copied())
    }

    /// Every route from a root down to `name`, inclusive.
    fn path_to(&self, name: &str) -> Option<Vec<&RouteDefinition>> {
        fn walk<'a>(
            routes: &'a [RouteDefinition],
            name: &str,
            path: &mut Vec<&'a RouteDefinition>,
        ) -> bool {
            for route in routes {
                path.push(route);
                if route.name == name || walk(&route.children, name, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        walk(&self.roots, name, &mut path).then_some(path)
    }

    /// A route can be opened when it and all of its ancestors are visible.
    pub fn can_open(&self, user: Option<&User>, name: &str) -> bool {
        self.path_to(name)
            .is_some_and(|path| path.iter().all(|route| can_access(user, &route.allowed)))
    }

    pub fn visible(&self, user: Option<&User>) -> Vec<VisibleRoute> {
        fn filter(routes: &[RouteDefinition], user: Option<&User>) -> Vec<VisibleRoute> {
            routes
                .iter()
                .filter(|route| can_access(user, &route.allowed))
                .map(|route| VisibleRoute {
                    name: route.name.clone(),
                    title: route.title.clone(),
                    in_menu: route.in_menu,
                    children: filter(&route.children, user),
                })
                .collect()
        }
        filter(&self.roots, user)
    }

    /// Menu entries in display order. A route left out of the menu also
    /// leaves out its children.
    pub fn menu(&self, user: Option<&User>) -> Vec<MenuEntry> {
        fn collect(routes: &[VisibleRoute], depth: usize, out: &mut Vec<MenuEntry>) {
            for route in routes.iter().filter(|route| route.in_menu) {
                out.push(MenuEntry {
                    name: route.name.clone(),
                    title: route.title.clone(),
                    depth,
                });
                collect(&route.children, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        collect(&self.visible(user), 0, &mut out);
        out
    }
}

pub mod names {
    pub const HOME: &str = "Home";
    pub const LOGIN: &str = "Login";
    pub const REGISTER: &str = "Register";
    pub const ATTENDANCE: &str = "Attendance";
    pub const CLOCK_IN: &str = "ClockIn";
    pub const TICKETS: &str = "Tickets";
    pub const ISSUE_TICKET: &str = "IssueTicket";
    pub const PERMISSIONS: &str = "Permissions";
    pub const REQUEST_PERMISSION: &str = "RequestPermission";
    pub const APPROVE_PERMISSIONS: &str = "ApprovePermissions";
    pub const REPORTS: &str = "Reports";
    pub const CREATE_REPORT: &str = "CreateReport";
    pub const CAMPUS_REPORTS: &str = "CampusReports";
    pub const GLOBAL_REPORTS: &str = "GlobalReports";
    pub const WORKFORCE: &str = "Workforce";
    pub const USERS: &str = "Users";
    pub const ASSIGN_ROLE: &str = "AssignRole";
    pub const SPECIAL_SERVICE: &str = "SpecialService";
    pub const PROFILE: &str = "Profile";
    pub const EDIT_PROFILE: &str = "EditProfile";
}

/// The application's navigation table.
pub fn workforce_routes() -> RouteTree {
    RouteTree {
        roots: workforce_route_definitions(),
    }
}

fn workforce_route_definitions() -> Vec<RouteDefinition> {
    use names::*;
    use AccessTag::{Department as D, Role as R};

    let heads = [R(Role::Admin), R(Role::Hod), R(Role::Ahod)];
    let pastors = [R(Role::Admin), R(Role::CampusPastor), R(Role::GlobalPastor)];

    vec![
        RouteDefinition::new(HOME, "Home"),
        RouteDefinition::new(ATTENDANCE, "Attendance")
            .child(RouteDefinition::new(CLOCK_IN, "Clock in").hidden_from_menu()),
        RouteDefinition::new(TICKETS, "Tickets").child(
            RouteDefinition::new(ISSUE_TICKET, "Issue ticket").allow([
                R(Role::Admin),
                R(Role::Qc),
                R(Role::Hod),
            ]),
        ),
        RouteDefinition::new(PERMISSIONS, "Permissions")
            .child(RouteDefinition::new(REQUEST_PERMISSION, "Request permission"))
            .child(RouteDefinition::new(APPROVE_PERMISSIONS, "Approvals").allow(heads)),
        RouteDefinition::new(REPORTS, "Reports")
            .allow(heads.into_iter().chain(pastors).chain([R(Role::Qc)]))
            .child(RouteDefinition::new(CREATE_REPORT, "New report").allow(heads))
            .child(RouteDefinition::new(CAMPUS_REPORTS, "Campus reports").allow(pastors))
            .child(
                RouteDefinition::new(GLOBAL_REPORTS, "Global reports")
                    .allow([R(Role::Admin), R(Role::GlobalPastor)]),
            ),
        RouteDefinition::new(WORKFORCE, "Workforce")
            .allow([R(Role::Admin), R(Role::GlobalPastor), R(Role::CampusPastor)])
            .child(RouteDefinition::new(USERS, "Users"))
            .child(
                RouteDefinition::new(ASSIGN_ROLE, "Assign role")
                    .allow([R(Role::Admin), R(Role::GlobalPastor)]),
            ),
        RouteDefinition::new(SPECIAL_SERVICE, "Special service")
            .allow([R(Role::Admin), D(Department::Media), D(Department::Technical)]),
        RouteDefinition::new(PROFILE, "Profile")
            .child(RouteDefinition::new(EDIT_PROFILE, "Edit profile").hidden_from_menu()),
        RouteDefinition::new(LOGIN, "Login").hidden_from_menu(),
        RouteDefinition::new(REGISTER, "Register").hidden_from_menu(),
    ]
}

#[cfg(test)]
#[path = "tests/routes_tests.rs"]
mod tests;
