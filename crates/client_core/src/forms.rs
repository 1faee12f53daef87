//! Single-page screens: schemas plus submit handlers.
//!
//! A handler never returns an error to its screen. Unauthorized users get
//! [`ScreenOutcome::Hidden`], invalid input gets field errors, and every
//! other failure becomes one error [`Notice`].

use chrono::{NaiveDate, Utc};
use shared::{
    domain::{Department, Role, User, UserId},
    error::ApiException,
    protocol::{
        AssignRoleRequest, ClockInRequest, CreateReportRequest, CreateTicketRequest,
        PermissionRequest, ReportCreated, TicketCategory, TicketCreated, UpdateUserRequest,
    },
};
use tracing::{info, warn};

use crate::{
    access::{can_access, can_assign_roles, can_create_reports, can_issue_tickets},
    api::WorkforceApi,
    notice::Notice,
    upload::{FileUpload, UploadProvider},
    validation::{FieldErrors, FieldSchema, FormValues, Rule, StepSchema},
};

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenOutcome<T> {
    /// The action is not available to this user; nothing is rendered.
    Hidden,
    Invalid(FieldErrors),
    Done { value: T, notice: Notice },
    Failed(Notice),
}

impl<T> ScreenOutcome<T> {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            ScreenOutcome::Done { notice, .. } | ScreenOutcome::Failed(notice) => Some(notice),
            ScreenOutcome::Hidden | ScreenOutcome::Invalid(_) => None,
        }
    }
}

fn text(values: &FormValues, key: &str) -> Option<String> {
    values
        .get(key)
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        })
        .filter(|s| !s.is_empty())
}

fn parse<T: std::str::FromStr>(values: &FormValues, key: &str) -> Option<T> {
    text(values, key).and_then(|s| s.parse().ok())
}

fn date(values: &FormValues, key: &str) -> Option<NaiveDate> {
    text(values, key).and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
}

fn invalid<T>(field: &str, message: &str) -> ScreenOutcome<T> {
    ScreenOutcome::Invalid(FieldErrors::from([(field.to_string(), message.to_string())]))
}

fn rejected<T>(action: &str, err: &ApiException) -> ScreenOutcome<T> {
    warn!(action, code = ?err.code, message = %err.message, "screen action failed");
    ScreenOutcome::Failed(Notice::from_api(err))
}

fn options<'a>(items: impl IntoIterator<Item = &'a str>) -> Rule {
    Rule::OneOf(items.into_iter().map(str::to_string).collect())
}

fn ticket_category(raw: &str) -> Option<TicketCategory> {
    serde_json::from_value(serde_json::Value::from(raw)).ok()
}

pub fn login_schema() -> StepSchema {
    StepSchema::new()
        .field(
            FieldSchema::new("email")
                .required("Email is required")
                .rule(Rule::Email, "Enter a valid email address"),
        )
        .field(FieldSchema::new("password").required("Password is required"))
}

pub const TICKET_CATEGORIES: &[&str] = &["lateness", "absence", "dressing", "conduct", "other"];

pub fn report_schema() -> StepSchema {
    StepSchema::new()
        .field(
            FieldSchema::new("serviceDate")
                .required("Service date is required")
                .rule(Rule::Date, "Use the format YYYY-MM-DD"),
        )
        .field(
            FieldSchema::new("workersPresent")
                .required("Enter the number of workers present")
                .rule(Rule::Digits, "Enter a whole number"),
        )
        .field(
            FieldSchema::new("workersAbsent")
                .required("Enter the number of workers absent")
                .rule(Rule::Digits, "Enter a whole number"),
        )
        .field(FieldSchema::new("remarks").rule(Rule::MaxLength(500), "Remarks are too long"))
}

/// Files the department service report, uploading attachments first.
pub async fn submit_report(
    api: &dyn WorkforceApi,
    uploader: &dyn UploadProvider,
    user: Option<&User>,
    values: &FormValues,
    attachments: Vec<FileUpload>,
) -> ScreenOutcome<ReportCreated> {
    if !can_create_reports(user) {
        return ScreenOutcome::Hidden;
    }
    let errors = report_schema().validate(values);
    if !errors.is_empty() {
        return ScreenOutcome::Invalid(errors);
    }
    let Some(department) = user.and_then(|u| u.department) else {
        return ScreenOutcome::Failed(Notice::error(
            "Your account is missing a department; contact an administrator",
        ));
    };
    // Digits alone still admit counts too large for u32.
    let service_date = date(values, "serviceDate");
    let workers_present = parse::<u32>(values, "workersPresent");
    let workers_absent = parse::<u32>(values, "workersAbsent");
    let (Some(service_date), Some(workers_present), Some(workers_absent)) =
        (service_date, workers_present, workers_absent)
    else {
        let mut errors = FieldErrors::new();
        if service_date.is_none() {
            errors.insert("serviceDate".into(), "Use the format YYYY-MM-DD".into());
        }
        if workers_present.is_none() {
            errors.insert("workersPresent".into(), "Enter a whole number".into());
        }
        if workers_absent.is_none() {
            errors.insert("workersAbsent".into(), "Enter a whole number".into());
        }
        return ScreenOutcome::Invalid(errors);
    };

    let mut attachment_urls = Vec::with_capacity(attachments.len());
    for file in attachments {
        match uploader.upload(file).await {
            Ok(url) => attachment_urls.push(url),
            Err(err) => return rejected("upload_report_attachment", &err),
        }
    }

    let request = CreateReportRequest {
        department,
        service_date,
        workers_present,
        workers_absent,
        remarks: text(values, "remarks"),
        attachment_urls,
    };
    match api.create_report(&request).await {
        Ok(created) => {
            info!(report_id = created.report_id.0, %department, "report created");
            ScreenOutcome::Done {
                value: created,
                notice: Notice::success("Report submitted"),
            }
        }
        Err(err) => rejected("create_report", &err),
    }
}

pub fn ticket_schema() -> StepSchema {
    StepSchema::new()
        .field(
            FieldSchema::new("userId")
                .required("Select a worker")
                .rule(Rule::Digits, "Select a worker"),
        )
        .field(
            FieldSchema::new("department")
                .required("Department is required")
                .rule(options(Department::ALL.iter().map(|d| d.as_str())), "Select a department"),
        )
        .field(
            FieldSchema::new("category")
                .required("Category is required")
                .rule(options(TICKET_CATEGORIES.iter().copied()), "Select a category"),
        )
        .field(
            FieldSchema::new("remarks")
                .required("Remarks are required")
                .rule(Rule::MaxLength(500), "Remarks are too long"),
        )
}

pub async fn issue_ticket(
    api: &dyn WorkforceApi,
    user: Option<&User>,
    values: &FormValues,
) -> ScreenOutcome<TicketCreated> {
    if !can_issue_tickets(user) {
        return ScreenOutcome::Hidden;
    }
    let errors = ticket_schema().validate(values);
    if !errors.is_empty() {
        return ScreenOutcome::Invalid(errors);
    }
    let (Some(user_id), Some(department), Some(category), Some(remarks)) = (
        parse::<i64>(values, "userId"),
        parse::<Department>(values, "department"),
        text(values, "category").as_deref().and_then(ticket_category),
        text(values, "remarks"),
    ) else {
        return ScreenOutcome::Failed(Notice::error("Ticket details are invalid"));
    };

    let request = CreateTicketRequest {
        user_id: UserId(user_id),
        department,
        category,
        remarks,
    };
    match api.create_ticket(&request).await {
        Ok(created) => ScreenOutcome::Done {
            value: created,
            notice: Notice::success("Ticket issued"),
        },
        Err(err) => rejected("create_ticket", &err),
    }
}

pub fn permission_request_schema() -> StepSchema {
    StepSchema::new()
        .field(
            FieldSchema::new("startDate")
                .required("Start date is required")
                .rule(Rule::Date, "Use the format YYYY-MM-DD"),
        )
        .field(
            FieldSchema::new("endDate")
                .required("End date is required")
                .rule(Rule::Date, "Use the format YYYY-MM-DD"),
        )
        .field(
            FieldSchema::new("reason")
                .required("Tell us why you need permission")
                .rule(Rule::MinLength(10), "Please give a little more detail"),
        )
}

pub async fn request_permission(
    api: &dyn WorkforceApi,
    user: Option<&User>,
    values: &FormValues,
) -> ScreenOutcome<()> {
    if !can_access(user, &[]) {
        return ScreenOutcome::Hidden;
    }
    let errors = permission_request_schema().validate(values);
    if !errors.is_empty() {
        return ScreenOutcome::Invalid(errors);
    }
    let (Some(start_date), Some(end_date), Some(reason)) = (
        date(values, "startDate"),
        date(values, "endDate"),
        text(values, "reason"),
    ) else {
        return ScreenOutcome::Failed(Notice::error("Permission request is invalid"));
    };
    if end_date < start_date {
        return invalid("endDate", "End date cannot be before start date");
    }

    let request = PermissionRequest {
        start_date,
        end_date,
        reason,
    };
    match api.request_permission(&request).await {
        Ok(()) => ScreenOutcome::Done {
            value: (),
            notice: Notice::success("Permission request sent"),
        },
        Err(err) => rejected("request_permission", &err),
    }
}

pub fn assign_role_schema() -> StepSchema {
    StepSchema::new()
        .field(
            FieldSchema::new("userId")
                .required("Select a worker")
                .rule(Rule::Digits, "Select a worker"),
        )
        .field(
            FieldSchema::new("role")
                .required("Role is required")
                .rule(options(Role::ALL.iter().map(|r| r.as_str())), "Select a role"),
        )
        .field(
            FieldSchema::new("department")
                .rule(options(Department::ALL.iter().map(|d| d.as_str())), "Select a department"),
        )
}

pub async fn assign_role(
    api: &dyn WorkforceApi,
    user: Option<&User>,
    values: &FormValues,
) -> ScreenOutcome<User> {
    if !can_assign_roles(user) {
        return ScreenOutcome::Hidden;
    }
    let errors = assign_role_schema().validate(values);
    if !errors.is_empty() {
        return ScreenOutcome::Invalid(errors);
    }
    let (Some(user_id), Some(role)) = (parse::<i64>(values, "userId"), parse::<Role>(values, "role"))
    else {
        return ScreenOutcome::Failed(Notice::error("Role assignment is invalid"));
    };
    // Only admins may create other admins.
    if role == Role::Admin && !crate::access::is_admin(user) {
        return invalid("role", "Only an administrator can grant the admin role");
    }

    let request = AssignRoleRequest {
        user_id: UserId(user_id),
        role,
        department: parse::<Department>(values, "department"),
    };
    match api.assign_role(&request).await {
        Ok(updated) => {
            info!(target_user = user_id, %role, "role assigned");
            ScreenOutcome::Done {
                notice: Notice::success(format!("{} is now {role}", updated.display_name())),
                value: updated,
            }
        }
        Err(err) => rejected("assign_role", &err),
    }
}

pub fn profile_schema() -> StepSchema {
    StepSchema::new()
        .field(FieldSchema::new("firstName").rule(Rule::MaxLength(50), "Name is too long"))
        .field(FieldSchema::new("lastName").rule(Rule::MaxLength(50), "Name is too long"))
        .field(
            FieldSchema::new("phoneNumber")
                .rule(Rule::Digits, "Phone number must contain digits only")
                .rule(Rule::MinLength(10), "Phone number is too short"),
        )
        .field(FieldSchema::new("address").rule(Rule::MaxLength(200), "Address is too long"))
}

/// Edits the signed-in user's own profile, optionally replacing the picture.
pub async fn update_profile(
    api: &dyn WorkforceApi,
    uploader: &dyn UploadProvider,
    user: Option<&User>,
    values: &FormValues,
    picture: Option<FileUpload>,
) -> ScreenOutcome<User> {
    let Some(current) = user.filter(|u| can_access(Some(*u), &[])) else {
        return ScreenOutcome::Hidden;
    };
    let errors = profile_schema().validate(values);
    if !errors.is_empty() {
        return ScreenOutcome::Invalid(errors);
    }

    let picture_url = match picture {
        Some(file) => match uploader.upload(file).await {
            Ok(url) => Some(url),
            Err(err) => return rejected("upload_profile_picture", &err),
        },
        None => None,
    };

    let request = UpdateUserRequest {
        first_name: text(values, "firstName"),
        last_name: text(values, "lastName"),
        phone_number: text(values, "phoneNumber"),
        occupation: text(values, "occupation"),
        address: text(values, "address"),
        picture_url,
    };
    if request == UpdateUserRequest::default() {
        return ScreenOutcome::Failed(Notice::error("Nothing to update"));
    }
    match api.update_user(current.id, &request).await {
        Ok(updated) => ScreenOutcome::Done {
            value: updated,
            notice: Notice::success("Profile updated"),
        },
        Err(err) => rejected("update_user", &err),
    }
}

/// Records attendance for the signed-in user at their campus.
pub async fn clock_in(api: &dyn WorkforceApi, user: Option<&User>) -> ScreenOutcome<()> {
    let Some(current) = user.filter(|u| can_access(Some(*u), &[])) else {
        return ScreenOutcome::Hidden;
    };
    let Some(campus) = current.campus.clone().filter(|c| !c.trim().is_empty()) else {
        return ScreenOutcome::Failed(Notice::error(
            "Your account is missing a campus; update your profile first",
        ));
    };
    let request = ClockInRequest {
        user_id: current.id,
        campus,
        clocked_at: Utc::now(),
    };
    match api.clock_in(&request).await {
        Ok(()) => ScreenOutcome::Done {
            value: (),
            notice: Notice::success("Clocked in"),
        },
        Err(err) => rejected("clock_in", &err),
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
