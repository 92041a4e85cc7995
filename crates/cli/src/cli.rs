//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use haven_core::Role;
use haven_session::RevalidationMode;

#[derive(Debug, Parser)]
#[command(
    name = "haven",
    version,
    about = "HavenWelfare client: sign in, manage your account, check page access"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Settings shared by every command. Each overrides its environment variable.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Backend origin without the /api suffix [env: HAVEN_BACKEND_URL]
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Credential file [env: HAVEN_CREDENTIALS_PATH, default: ~/.haven/credentials.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// What to do when the stored session cannot be confirmed at startup
    /// (fail-closed or retry-transient) [env: HAVEN_REVALIDATION]
    #[arg(long, global = true, value_name = "MODE")]
    pub revalidation: Option<RevalidationMode>,

    /// Attempts for retry-transient [env: HAVEN_REVALIDATION_MAX_ATTEMPTS]
    #[arg(long, global = true, value_name = "N")]
    pub max_attempts: Option<u32>,

    /// Per-request timeout in seconds, 0 to disable [env: HAVEN_REQUEST_TIMEOUT_SECS]
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in and print the dashboard path for your role
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Create a doctor or patient account (needs admin approval)
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        /// doctor or patient
        #[arg(long)]
        role: Role,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Email a password reset link
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using the token from the reset email
    ResetPassword {
        #[arg(long)]
        token: String,
    },
    /// Change the signed-in account's password
    ChangePassword,
    /// Show the profile, or update the given fields
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Print what happens when the current session opens PATH
    Visit { path: String },
    /// Print the navigation menu for the signed-in role
    Menu {
        /// Mark the entry active for this path
        #[arg(long, value_name = "PATH")]
        current: Option<String>,
    },
}
