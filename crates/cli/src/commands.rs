//! One handler per subcommand. Output goes to stdout; logs go to stderr.

use anyhow::{anyhow, bail, Context};
use haven_core::auth::{RegisterRequest, UpdateProfileRequest};
use haven_core::navigation::{is_active, menu_for};
use haven_core::UserProfile;
use haven_session::{navigate, resolve, GuardDecision, SessionError, SessionSnapshot};
use rpassword::prompt_password;

use crate::app::App;
use crate::cli::Command;

pub async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    let store = &app.store;
    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password, "Password: ")?;
            let user = store
                .login(&email, &password)
                .await
                .map_err(verbatim)
                .context("Login failed")?;
            println!("Logged in as {} ({})", user.name, user.role);
            println!("{}", user.home_path());
        }

        Command::Logout => {
            store.logout();
            println!("Logged out");
        }

        Command::Whoami => {
            let user = signed_in(&store.snapshot())?;
            print_profile(&user)?;
        }

        Command::Register {
            email,
            name,
            phone,
            role,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => new_password()?,
            };
            let request = RegisterRequest {
                email,
                name,
                phone,
                password,
                role,
            };
            let user = store
                .register(&request)
                .await
                .map_err(verbatim)
                .context("Registration failed")?;
            println!(
                "Registered {} as {}. An administrator must approve the account before you can log in.",
                user.email, user.role
            );
        }

        Command::ForgotPassword { email } => {
            let reply = store
                .forgot_password(&email)
                .await
                .map_err(verbatim)
                .context("Password reset request failed")?;
            println!("{}", reply.message);
        }

        Command::ResetPassword { token } => {
            let password = new_password()?;
            let reply = store
                .reset_password(&token, &password)
                .await
                .map_err(verbatim)
                .context("Password reset failed")?;
            println!("{}", reply.message);
        }

        Command::ChangePassword => {
            signed_in(&store.snapshot())?;
            let current = prompt_password("Current password: ")?;
            let new = new_password()?;
            let reply = store
                .change_password(&current, &new)
                .await
                .map_err(verbatim)
                .context("Password change failed")?;
            println!("{}", reply.message);
        }

        Command::Profile { name, phone, email } => {
            signed_in(&store.snapshot())?;
            let request = UpdateProfileRequest {
                name,
                phone,
                email,
                profile_data: None,
            };
            let user = if request.is_empty() {
                store.refresh_user().await
            } else {
                store.update_profile(&request).await
            }
            .map_err(verbatim)
            .context("Profile request failed")?;
            print_profile(&user)?;
        }

        Command::Visit { path } => {
            println!("{}", describe_visit(&store.snapshot(), &path));
        }

        Command::Menu { current } => {
            let user = signed_in(&store.snapshot())?;
            let current = current.as_deref().unwrap_or(user.home_path());
            for item in menu_for(user.role) {
                let marker = if is_active(user.role, item.path, current) {
                    '*'
                } else {
                    ' '
                };
                println!("{marker} {:<20} {}", item.label, item.path);
            }
        }
    }
    Ok(())
}

/// Keep the backend's wording; the context line says what failed.
fn verbatim(error: SessionError) -> anyhow::Error {
    anyhow!(error.message())
}

fn signed_in(session: &SessionSnapshot) -> anyhow::Result<UserProfile> {
    match (&session.token, &session.user) {
        (Some(_), Some(user)) => Ok(user.clone()),
        _ => bail!("Not logged in. Run `haven login --email <EMAIL>` first."),
    }
}

fn print_profile(user: &UserProfile) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}

fn password_or_prompt(password: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => prompt_password(prompt).context("Failed to read password"),
    }
}

fn new_password() -> anyhow::Result<String> {
    let first = prompt_password("New password: ").context("Failed to read password")?;
    let second = prompt_password("Repeat new password: ").context("Failed to read password")?;
    if first != second {
        bail!("Passwords do not match");
    }
    Ok(first)
}

/// One-line description of what opening `path` does for `session`.
pub fn describe_visit(session: &SessionSnapshot, path: &str) -> String {
    match navigate(session, path) {
        GuardDecision::Loading => "loading".to_string(),
        GuardDecision::Redirect { to, replace } => {
            let mode = if replace { "replace" } else { "push" };
            format!("redirect {to} ({mode})")
        }
        GuardDecision::Render => match resolve(path) {
            Some(route) => format!("render {}", route.page),
            None => "render".to_string(),
        },
    }
}
