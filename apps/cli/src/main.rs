mod prompt;

use std::{io, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    forms, load_settings, registration_form, validation::form_values, FileUpload, Permissions,
    RouteTree, ScreenOutcome, WorkforceClient,
};
use shared::domain::{Department, Role, User, UserId};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    /// Path to the client config file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Prints the menu a role would see, without contacting the server.
    Menu {
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        department: Option<String>,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Walks through the registration steps on the terminal.
    Register,
    /// Files a service report for the signed-in head of department.
    Report {
        #[arg(long)]
        service_date: String,
        #[arg(long)]
        present: u32,
        #[arg(long)]
        absent: u32,
        #[arg(long)]
        remarks: Option<String>,
        #[arg(long = "attachment")]
        attachments: Vec<PathBuf>,
    },
    ClockIn,
    AssignRole {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        role: String,
        #[arg(long)]
        department: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let cli = Cli::parse();

    if let Command::Menu { role, department } = &cli.command {
        return print_offline_menu(role.as_deref(), department.as_deref());
    }

    let settings = load_settings(cli.config.as_deref())?;
    debug!(api = %settings.api_base_url, "loaded client settings");
    let client = WorkforceClient::from_settings(&settings).await?;

    match cli.command {
        Command::Menu { .. } => {}
        Command::Login { email, password } => {
            let outcome = client
                .login(&form_values([
                    ("email", email.as_str()),
                    ("password", password.as_str()),
                ]))
                .await;
            report(outcome)?;
            print_menu(&client).await;
        }
        Command::Logout => {
            if client.logout().await? {
                println!("Signed out");
            } else {
                println!("No session to clear");
            }
        }
        Command::Whoami => match client.restore().await? {
            Some(user) => {
                println!(
                    "{} <{}> role={} department={}",
                    user.display_name(),
                    user.email,
                    user.role.map(|r| r.as_str()).unwrap_or("-"),
                    user.department.map(|d| d.as_str()).unwrap_or("-"),
                );
                print_permissions(&client.permissions().await);
                print_menu(&client).await;
            }
            None => println!("Not signed in"),
        },
        Command::Register => {
            let form = Arc::new(Mutex::new(registration_form()?));
            let flow = client.registration_flow();
            let session = prompt::register(
                &flow,
                &form,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            )
            .await?;
            println!("Welcome, {}", session.user.first_name);
            client.adopt(session).await;
            print_menu(&client).await;
        }
        Command::Report {
            service_date,
            present,
            absent,
            remarks,
            attachments,
        } => {
            client.restore().await?;
            let user = client.current_user().await;
            let mut files = Vec::with_capacity(attachments.len());
            for path in attachments {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("failed to read attachment '{}'", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "attachment".to_string());
                files.push(FileUpload {
                    filename,
                    content_type: None,
                    bytes,
                });
            }
            let present = present.to_string();
            let absent = absent.to_string();
            let mut pairs = vec![
                ("serviceDate", service_date.as_str()),
                ("workersPresent", present.as_str()),
                ("workersAbsent", absent.as_str()),
            ];
            if let Some(remarks) = remarks.as_deref() {
                pairs.push(("remarks", remarks));
            }
            let outcome = forms::submit_report(
                client.api().as_ref(),
                client.uploader().as_ref(),
                user.as_ref(),
                &form_values(pairs),
                files,
            )
            .await;
            report(outcome)?;
        }
        Command::ClockIn => {
            client.restore().await?;
            let user = client.current_user().await;
            report(forms::clock_in(client.api().as_ref(), user.as_ref()).await)?;
        }
        Command::AssignRole {
            user_id,
            role,
            department,
        } => {
            client.restore().await?;
            let user = client.current_user().await;
            let user_id = user_id.to_string();
            let mut pairs = vec![("userId", user_id.as_str()), ("role", role.as_str())];
            if let Some(department) = department.as_deref() {
                pairs.push(("department", department));
            }
            let outcome =
                forms::assign_role(client.api().as_ref(), user.as_ref(), &form_values(pairs))
                    .await;
            report(outcome)?;
        }
    }

    Ok(())
}

fn report<T>(outcome: ScreenOutcome<T>) -> Result<()> {
    match outcome {
        ScreenOutcome::Done { notice, .. } => {
            println!("{}", notice.message());
            Ok(())
        }
        ScreenOutcome::Hidden => bail!("You do not have access to this screen"),
        ScreenOutcome::Invalid(errors) => {
            for (field, message) in &errors {
                println!("  {field}: {message}");
            }
            bail!("Please correct the highlighted fields")
        }
        ScreenOutcome::Failed(notice) => bail!("{}", notice.message()),
    }
}

fn print_offline_menu(role: Option<&str>, department: Option<&str>) -> Result<()> {
    let role = role.map(str::parse::<Role>).transpose()?;
    let department = department.map(str::parse::<Department>).transpose()?;
    let user = User {
        id: UserId(0),
        first_name: "preview".into(),
        last_name: String::new(),
        email: String::new(),
        role,
        department,
        campus: None,
        special_workflow_approved: false,
    };
    let routes: RouteTree = client_core::workforce_routes();
    for entry in routes.menu(Some(&user)) {
        println!("{}{}", "  ".repeat(entry.depth), entry.title);
    }
    print_permissions(&Permissions::for_user(Some(&user)));
    Ok(())
}

async fn print_menu(client: &WorkforceClient) {
    for entry in client.menu().await {
        println!("{}{}", "  ".repeat(entry.depth), entry.title);
    }
}

fn print_permissions(permissions: &Permissions) {
    let flags = [
        ("approve", permissions.can_approve),
        ("issue-tickets", permissions.can_issue_tickets),
        ("campus-reports", permissions.can_view_campus_reports),
        ("global-reports", permissions.can_view_global_reports),
        ("manage-users", permissions.can_manage_users),
        ("assign-roles", permissions.can_assign_roles),
        ("create-reports", permissions.can_create_reports),
        ("special-workflow", permissions.can_use_special_workflow),
    ];
    let granted: Vec<&str> = flags
        .iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| *name)
        .collect();
    if granted.is_empty() {
        println!("permissions: none");
    } else {
        println!("permissions: {}", granted.join(", "));
    }
}
