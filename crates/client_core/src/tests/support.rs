//! Test doubles shared by the flow and screen tests.

use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use shared::{
    domain::{Department, ReportId, Role, TicketId, User, UserId},
    error::{ApiException, ErrorCode},
    protocol::{
        AssignRoleRequest, ClockInRequest, CreateReportRequest, CreateTicketRequest,
        LoginRequest, PermissionRequest, RegisterRequest, ReportCreated, Session, TicketCreated,
        UpdateUserRequest,
    },
};
use tokio::sync::Notify;

use crate::{
    api::{ApiResult, WorkforceApi},
    upload::{FileUpload, UploadProvider},
};

pub fn user(role: Option<Role>, department: Option<Department>) -> User {
    User {
        id: UserId(77),
        first_name: "Ada".into(),
        last_name: "Obi".into(),
        email: "ada@example.com".into(),
        role,
        department,
        campus: Some("Ikeja".into()),
        special_workflow_approved: false,
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub calls: StdMutex<Vec<String>>,
    pub registered: StdMutex<Vec<RegisterRequest>>,
    pub reports: StdMutex<Vec<CreateReportRequest>>,
    pub tickets: StdMutex<Vec<CreateTicketRequest>>,
    pub permissions: StdMutex<Vec<PermissionRequest>>,
    pub assignments: StdMutex<Vec<AssignRoleRequest>>,
    pub updates: StdMutex<Vec<UpdateUserRequest>>,
    pub clock_ins: StdMutex<Vec<ClockInRequest>>,
    pub token: StdMutex<Option<String>>,
    pub fail_register: Option<ApiException>,
    pub fail_login: Option<ApiException>,
    pub fail_all: Option<ApiException>,
    /// When set, `register` waits for a notification before answering.
    pub register_gate: Option<Arc<Notify>>,
}

impl FakeApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls").clone()
    }

    fn record(&self, call: &str) -> ApiResult<()> {
        self.calls.lock().expect("calls").push(call.to_string());
        match &self.fail_all {
            Some(err) => Err(ApiException::new(err.code, err.message.clone())),
            None => Ok(()),
        }
    }
}

fn copy(err: &ApiException) -> ApiException {
    ApiException::new(err.code, err.message.clone())
}

#[async_trait]
impl WorkforceApi for FakeApi {
    async fn register(&self, request: &RegisterRequest) -> ApiResult<User> {
        self.record("register")?;
        if let Some(gate) = &self.register_gate {
            gate.notified().await;
        }
        if let Some(err) = &self.fail_register {
            return Err(copy(err));
        }
        self.registered.lock().expect("registered").push(request.clone());
        Ok(User {
            id: UserId(501),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone().unwrap_or_default(),
            email: request.email.clone(),
            role: Some(Role::Worker),
            department: request.department,
            campus: request.campus.clone(),
            special_workflow_approved: false,
        })
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<Session> {
        self.record("login")?;
        if let Some(err) = &self.fail_login {
            return Err(copy(err));
        }
        Ok(Session {
            token: format!("token-for-{}", request.email),
            user: User {
                id: UserId(501),
                first_name: "New".into(),
                last_name: String::new(),
                email: request.email.clone(),
                role: Some(Role::Worker),
                department: None,
                campus: None,
                special_workflow_approved: false,
            },
        })
    }

    async fn fetch_profile(&self) -> ApiResult<User> {
        self.record("fetch_profile")?;
        Ok(user(Some(Role::Worker), None))
    }

    async fn update_user(&self, user_id: UserId, request: &UpdateUserRequest) -> ApiResult<User> {
        self.record("update_user")?;
        self.updates.lock().expect("updates").push(request.clone());
        let mut updated = user(Some(Role::Worker), None);
        updated.id = user_id;
        if let Some(first_name) = &request.first_name {
            updated.first_name = first_name.clone();
        }
        Ok(updated)
    }

    async fn assign_role(&self, request: &AssignRoleRequest) -> ApiResult<User> {
        self.record("assign_role")?;
        self.assignments.lock().expect("assignments").push(request.clone());
        let mut assigned = user(Some(request.role), request.department);
        assigned.id = request.user_id;
        Ok(assigned)
    }

    async fn create_report(&self, request: &CreateReportRequest) -> ApiResult<ReportCreated> {
        self.record("create_report")?;
        self.reports.lock().expect("reports").push(request.clone());
        Ok(ReportCreated {
            report_id: ReportId(1),
        })
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> ApiResult<TicketCreated> {
        self.record("create_ticket")?;
        self.tickets.lock().expect("tickets").push(request.clone());
        Ok(TicketCreated {
            ticket_id: TicketId(9),
        })
    }

    async fn request_permission(&self, request: &PermissionRequest) -> ApiResult<()> {
        self.record("request_permission")?;
        self.permissions.lock().expect("permissions").push(request.clone());
        Ok(())
    }

    async fn clock_in(&self, request: &ClockInRequest) -> ApiResult<()> {
        self.record("clock_in")?;
        self.clock_ins.lock().expect("clock_ins").push(request.clone());
        Ok(())
    }

    async fn set_token(&self, token: Option<String>) {
        *self.token.lock().expect("token") = token;
    }
}

#[derive(Default)]
pub struct FakeUploader {
    pub uploaded: StdMutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl UploadProvider for FakeUploader {
    async fn upload(&self, file: FileUpload) -> ApiResult<String> {
        if self.fail {
            return Err(ApiException::new(ErrorCode::Transport, "Upload failed"));
        }
        let url = format!("https://files.example.com/{}", file.filename);
        self.uploaded.lock().expect("uploaded").push(url.clone());
        Ok(url)
    }
}
