use super::*;
use crate::access::{
    can_approve, can_assign_roles, can_create_reports, can_issue_tickets,
    can_view_campus_reports, can_view_global_reports,
};
use shared::domain::UserId;

fn user(role: Role, department: Option<Department>) -> User {
    User {
        id: UserId(3),
        first_name: "Femi".into(),
        last_name: String::new(),
        email: "femi@example.com".into(),
        role: Some(role),
        department,
        campus: None,
        special_workflow_approved: false,
    }
}

fn menu_names(tree: &RouteTree, user: Option<&User>) -> Vec<String> {
    tree.menu(user).into_iter().map(|entry| entry.name).collect()
}

#[test]
fn workforce_table_has_unique_names() {
    assert!(RouteTree::new(workforce_route_definitions()).is_ok());
}

#[test]
fn duplicate_names_are_rejected() {
    let err = RouteTree::new(vec![
        RouteDefinition::new("Home", "Home"),
        RouteDefinition::new("Reports", "Reports").child(RouteDefinition::new("Home", "Again")),
    ])
    .expect_err("duplicate");
    assert_eq!(err, RouteTreeError::DuplicateName("Home".into()));

    let err = RouteTree::new(vec![RouteDefinition::new("", "Nameless")]).expect_err("empty");
    assert_eq!(err, RouteTreeError::EmptyName);
}

#[test]
fn worker_sees_only_open_sections() {
    let tree = workforce_routes();
    let worker = user(Role::Worker, Some(Department::Choir));
    assert_eq!(
        menu_names(&tree, Some(&worker)),
        vec![
            names::HOME,
            names::ATTENDANCE,
            names::TICKETS,
            names::PERMISSIONS,
            names::REQUEST_PERMISSION,
            names::PROFILE,
        ]
    );
}

#[test]
fn department_grants_access_to_guarded_route() {
    let tree = workforce_routes();
    let media = user(Role::Worker, Some(Department::Media));
    assert!(tree.can_open(Some(&media), names::SPECIAL_SERVICE));

    let choir = user(Role::Worker, Some(Department::Choir));
    assert!(!tree.can_open(Some(&choir), names::SPECIAL_SERVICE));
}

#[test]
fn hidden_parent_hides_children() {
    let tree = workforce_routes();
    let qc = user(Role::Qc, None);
    // QC may see Reports but none of its guarded children.
    let reports = tree
        .visible(Some(&qc))
        .into_iter()
        .find(|route| route.name == names::REPORTS)
        .expect("reports visible");
    assert!(reports.children.is_empty());

    let worker = user(Role::Worker, None);
    assert!(!tree.can_open(Some(&worker), names::USERS));
    let admin = user(Role::Admin, None);
    assert!(tree.can_open(Some(&admin), names::USERS));
}

#[test]
fn non_menu_routes_stay_reachable() {
    let tree = workforce_routes();
    let worker = user(Role::Worker, None);
    let names_in_menu = menu_names(&tree, Some(&worker));
    assert!(!names_in_menu.contains(&names::CLOCK_IN.to_string()));
    assert!(tree.can_open(Some(&worker), names::CLOCK_IN));
    assert!(tree.find(names::EDIT_PROFILE).is_some());
    assert!(tree.find("Nowhere").is_none());
}

#[test]
fn anonymous_user_sees_nothing() {
    let tree = workforce_routes();
    assert!(tree.visible(None).is_empty());
    assert!(!tree.can_open(None, names::HOME));
}

#[test]
fn menu_depth_follows_nesting() {
    let tree = workforce_routes();
    let admin = user(Role::Admin, None);
    let menu = tree.menu(Some(&admin));
    let assign = menu
        .iter()
        .find(|entry| entry.name == names::ASSIGN_ROLE)
        .expect("assign role in menu");
    assert_eq!(assign.depth, 1);
    assert!(menu.iter().all(|entry| entry.name != names::LOGIN));
}

#[test]
fn action_routes_agree_with_their_predicates() {
    let tree = workforce_routes();
    let checks: [(&str, fn(Option<&User>) -> bool); 6] = [
        (names::ISSUE_TICKET, can_issue_tickets),
        (names::CREATE_REPORT, can_create_reports),
        (names::ASSIGN_ROLE, can_assign_roles),
        (names::APPROVE_PERMISSIONS, can_approve),
        (names::CAMPUS_REPORTS, can_view_campus_reports),
        (names::GLOBAL_REPORTS, can_view_global_reports),
    ];
    let departments = Department::ALL.iter().copied().map(Some).chain([None]);
    for department in departments {
        for role in Role::ALL.iter().copied() {
            let member = user(role, department);
            for (route, predicate) in checks {
                assert_eq!(
                    tree.can_open(Some(&member), route),
                    predicate(Some(&member)),
                    "{route} for {role} in {department:?}"
                );
            }
        }
    }
}

#[test]
fn quality_control_worker_cannot_open_ticket_issue() {
    let tree = workforce_routes();
    let worker = user(Role::Worker, Some(Department::QualityControl));
    assert!(!tree.can_open(Some(&worker), names::ISSUE_TICKET));
    assert!(!can_issue_tickets(Some(&worker)));
}
