use super::*;
use crate::{
    test_support::{user, FakeApi, FakeUploader},
    validation::form_values,
};
use shared::error::{ErrorCode, GENERIC_ERROR_MESSAGE};

fn report_values() -> FormValues {
    form_values([
        ("serviceDate", "2024-03-10"),
        ("workersPresent", "18"),
        ("workersAbsent", "2"),
        ("remarks", "Smooth service"),
    ])
}

#[tokio::test]
async fn worker_cannot_see_report_form() {
    let api = FakeApi::default();
    let worker = user(Some(Role::Worker), Some(Department::Media));
    let outcome = submit_report(
        &api,
        &FakeUploader::default(),
        Some(&worker),
        &report_values(),
        Vec::new(),
    )
    .await;
    assert_eq!(outcome, ScreenOutcome::Hidden);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn hod_report_uploads_attachments_first() {
    let api = FakeApi::default();
    let uploader = FakeUploader::default();
    let hod = user(Some(Role::Hod), Some(Department::Choir));
    let outcome = submit_report(
        &api,
        &uploader,
        Some(&hod),
        &report_values(),
        vec![FileUpload {
            filename: "roster.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![1, 2, 3],
        }],
    )
    .await;

    assert!(matches!(outcome, ScreenOutcome::Done { .. }));
    assert_eq!(outcome.notice().map(Notice::message), Some("Report submitted"));
    let reports = api.reports.lock().expect("reports").clone();
    assert_eq!(reports[0].department, Department::Choir);
    assert_eq!(reports[0].workers_present, 18);
    assert_eq!(
        reports[0].attachment_urls,
        vec!["https://files.example.com/roster.png".to_string()]
    );
}

#[tokio::test]
async fn failed_upload_stops_report() {
    let api = FakeApi::default();
    let uploader = FakeUploader {
        fail: true,
        ..FakeUploader::default()
    };
    let hod = user(Some(Role::Hod), Some(Department::Choir));
    let outcome = submit_report(
        &api,
        &uploader,
        Some(&hod),
        &report_values(),
        vec![FileUpload {
            filename: "a.pdf".into(),
            content_type: None,
            bytes: Vec::new(),
        }],
    )
    .await;

    let notice = match outcome {
        ScreenOutcome::Failed(notice) => notice,
        other => panic!("expected failure, got {other:?}"),
    };
    assert_eq!(notice.message(), "Upload failed");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn report_without_department_fails_with_notice() {
    let api = FakeApi::default();
    let admin = user(Some(Role::Admin), None);
    let outcome = submit_report(
        &api,
        &FakeUploader::default(),
        Some(&admin),
        &report_values(),
        Vec::new(),
    )
    .await;
    assert!(matches!(outcome, ScreenOutcome::Failed(_)));
}

#[tokio::test]
async fn invalid_report_shows_field_errors() {
    let api = FakeApi::default();
    let hod = user(Some(Role::Hod), Some(Department::Choir));
    let outcome = submit_report(
        &api,
        &FakeUploader::default(),
        Some(&hod),
        &form_values([("serviceDate", "yesterday"), ("workersPresent", "ten")]),
        Vec::new(),
    )
    .await;

    let errors = match outcome {
        ScreenOutcome::Invalid(errors) => errors,
        other => panic!("expected field errors, got {other:?}"),
    };
    assert_eq!(errors["serviceDate"], "Use the format YYYY-MM-DD");
    assert_eq!(errors["workersPresent"], "Enter a whole number");
    assert_eq!(errors["workersAbsent"], "Enter the number of workers absent");
}

#[tokio::test]
async fn oversized_count_is_reported_on_its_own_field() {
    let api = FakeApi::default();
    let hod = user(Some(Role::Hod), Some(Department::Choir));
    let outcome = submit_report(
        &api,
        &FakeUploader::default(),
        Some(&hod),
        &form_values([
            ("serviceDate", "2024-03-10"),
            ("workersPresent", "18"),
            ("workersAbsent", "99999999999"),
        ]),
        Vec::new(),
    )
    .await;

    let errors = match outcome {
        ScreenOutcome::Invalid(errors) => errors,
        other => panic!("expected field errors, got {other:?}"),
    };
    assert_eq!(errors.len(), 1);
    assert_eq!(errors["workersAbsent"], "Enter a whole number");
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn qc_issues_ticket() {
    let api = FakeApi::default();
    let qc = user(Some(Role::Qc), None);
    let outcome = issue_ticket(
        &api,
        Some(&qc),
        &form_values([
            ("userId", "12"),
            ("department", "Ushery"),
            ("category", "lateness"),
            ("remarks", "Arrived after briefing"),
        ]),
    )
    .await;

    assert!(matches!(outcome, ScreenOutcome::Done { .. }));
    let tickets = api.tickets.lock().expect("tickets").clone();
    assert_eq!(tickets[0].user_id, UserId(12));
    assert_eq!(tickets[0].category, TicketCategory::Lateness);
}

#[tokio::test]
async fn campus_pastor_cannot_issue_ticket() {
    let api = FakeApi::default();
    let pastor = user(Some(Role::CampusPastor), None);
    let outcome = issue_ticket(&api, Some(&pastor), &FormValues::new()).await;
    assert_eq!(outcome, ScreenOutcome::Hidden);
}

#[tokio::test]
async fn permission_end_before_start_is_a_field_error() {
    let api = FakeApi::default();
    let worker = user(Some(Role::Worker), None);
    let outcome = request_permission(
        &api,
        Some(&worker),
        &form_values([
            ("startDate", "2024-06-10"),
            ("endDate", "2024-06-01"),
            ("reason", "Family wedding out of town"),
        ]),
    )
    .await;

    let errors = match outcome {
        ScreenOutcome::Invalid(errors) => errors,
        other => panic!("expected field errors, got {other:?}"),
    };
    assert!(errors.contains_key("endDate"));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn server_failure_becomes_single_notice() {
    let api = FakeApi {
        fail_all: Some(ApiException::new(ErrorCode::Internal, "")),
        ..FakeApi::default()
    };
    let worker = user(Some(Role::Worker), None);
    let outcome = request_permission(
        &api,
        Some(&worker),
        &form_values([
            ("startDate", "2024-06-01"),
            ("endDate", "2024-06-03"),
            ("reason", "Family wedding out of town"),
        ]),
    )
    .await;

    let notice = match outcome {
        ScreenOutcome::Failed(notice) => notice,
        other => panic!("expected failure, got {other:?}"),
    };
    assert_eq!(notice.message(), GENERIC_ERROR_MESSAGE);
}

#[tokio::test]
async fn anonymous_user_sees_no_permission_form() {
    let api = FakeApi::default();
    let outcome = request_permission(&api, None, &FormValues::new()).await;
    assert_eq!(outcome, ScreenOutcome::Hidden);
}

#[tokio::test]
async fn global_pastor_assigns_roles_but_not_admin() {
    let api = FakeApi::default();
    let pastor = user(Some(Role::GlobalPastor), None);

    let outcome = assign_role(
        &api,
        Some(&pastor),
        &form_values([("userId", "30"), ("role", "HOD"), ("department", "Media")]),
    )
    .await;
    let (value, notice) = match outcome {
        ScreenOutcome::Done { value, notice } => (value, notice),
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(value.role, Some(Role::Hod));
    assert!(notice.message().ends_with("is now HOD"));

    let outcome = assign_role(
        &api,
        Some(&pastor),
        &form_values([("userId", "30"), ("role", "admin")]),
    )
    .await;
    assert!(matches!(outcome, ScreenOutcome::Invalid(_)));
    assert_eq!(api.assignments.lock().expect("assignments").len(), 1);
}

#[tokio::test]
async fn role_names_are_matched_exactly_in_assignment() {
    let api = FakeApi::default();
    let admin = user(Some(Role::Admin), None);
    let outcome = assign_role(
        &api,
        Some(&admin),
        &form_values([("userId", "30"), ("role", "hod")]),
    )
    .await;
    let errors = match outcome {
        ScreenOutcome::Invalid(errors) => errors,
        other => panic!("expected field errors, got {other:?}"),
    };
    assert_eq!(errors["role"], "Select a role");
}

#[tokio::test]
async fn profile_update_uploads_picture() {
    let api = FakeApi::default();
    let uploader = FakeUploader::default();
    let worker = user(Some(Role::Worker), None);
    let outcome = update_profile(
        &api,
        &uploader,
        Some(&worker),
        &form_values([("firstName", "Adaeze")]),
        Some(FileUpload {
            filename: "me.jpg".into(),
            content_type: Some("image/jpeg".into()),
            bytes: vec![0xff],
        }),
    )
    .await;

    let value = match outcome {
        ScreenOutcome::Done { value, .. } => value,
        other => panic!("expected success, got {other:?}"),
    };
    assert_eq!(value.first_name, "Adaeze");
    let updates = api.updates.lock().expect("updates").clone();
    assert_eq!(
        updates[0].picture_url.as_deref(),
        Some("https://files.example.com/me.jpg")
    );
}

#[tokio::test]
async fn empty_profile_update_is_refused() {
    let api = FakeApi::default();
    let worker = user(Some(Role::Worker), None);
    let outcome = update_profile(
        &api,
        &FakeUploader::default(),
        Some(&worker),
        &FormValues::new(),
        None,
    )
    .await;
    assert!(matches!(outcome, ScreenOutcome::Failed(_)));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn clock_in_uses_user_campus() {
    let api = FakeApi::default();
    let worker = user(Some(Role::Worker), None);
    let outcome = clock_in(&api, Some(&worker)).await;
    assert!(matches!(outcome, ScreenOutcome::Done { .. }));
    let clock_ins = api.clock_ins.lock().expect("clock_ins").clone();
    assert_eq!(clock_ins[0].campus, "Ikeja");

    let mut no_campus = user(Some(Role::Worker), None);
    no_campus.campus = None;
    assert!(matches!(
        clock_in(&api, Some(&no_campus)).await,
        ScreenOutcome::Failed(_)
    ));
    assert_eq!(clock_in(&api, None).await, ScreenOutcome::Hidden);
}
