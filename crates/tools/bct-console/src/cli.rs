use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bct-console")]
#[command(about = "Administration console for the BCT regulatory reporting platform")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a login; prints the identity provider URL to open
    Login,

    /// Finish a login with the parameters the provider redirected back with
    Callback(CallbackArgs),

    /// Open the self-registration page
    Register,

    /// End the session locally and at the identity provider
    Logout,

    /// Show the logged-in user and their realm roles
    Whoami,

    /// Navigate to a console route and report what the guard decided
    Navigate {
        /// Route path, e.g. /user-management
        path: String,
    },

    /// Manage user accounts
    #[command(subcommand)]
    Users(UsersCommand),

    /// Realm roles
    #[command(subcommand)]
    Roles(RolesCommand),

    /// Manage regulatory declaration types
    #[command(subcommand)]
    DeclarationTypes(DeclarationTypesCommand),
}

#[derive(Args, Debug)]
pub struct CallbackArgs {
    /// Full redirect URL as shown in the browser address bar
    #[arg(long, conflicts_with_all = ["code", "state"])]
    pub url: Option<String>,

    #[arg(long, requires = "state")]
    pub code: Option<String>,

    #[arg(long, requires = "code")]
    pub state: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// List every user
    List,

    /// Show one user
    Get { id: String },

    /// Search by username, email or name
    Search { query: String },

    /// Create a user
    Create(CreateUserArgs),

    /// Update profile fields
    Update(UpdateUserArgs),

    /// Delete a user
    Delete { id: String },

    /// Enable an account
    Enable { id: String },

    /// Disable an account
    Disable { id: String },

    /// Email a password-reset link
    ResetPassword { id: String },

    /// Show a user's realm roles
    Roles { id: String },

    /// Grant realm roles (e.g. ROLE_AGENT)
    AssignRole {
        id: String,
        #[arg(required = true, num_args = 1..)]
        roles: Vec<String>,
    },

    /// Revoke realm roles
    RemoveRole {
        id: String,
        #[arg(required = true, num_args = 1..)]
        roles: Vec<String>,
    },

    /// List the users holding a role
    ByRole { role: String },
}

#[derive(Args, Debug)]
pub struct CreateUserArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub first_name: String,

    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub password: String,

    /// Realm role to grant; repeatable
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Create the account disabled
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Args, Debug)]
pub struct UpdateUserArgs {
    pub id: String,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommand {
    /// List realm roles
    List,
}

#[derive(Subcommand, Debug)]
pub enum DeclarationTypesCommand {
    /// List declaration types
    List,

    /// Create a declaration type
    Create(DeclarationTypeArgs),

    /// Change fields of an existing declaration type
    Update(UpdateDeclarationTypeArgs),

    /// Delete a declaration type
    Delete { id: i64 },

    /// Activate or deactivate a declaration type
    Toggle { id: i64 },
}

#[derive(Args, Debug)]
pub struct DeclarationTypeArgs {
    #[arg(long)]
    pub code: String,

    #[arg(long)]
    pub nom: String,

    /// File format, e.g. XML
    #[arg(long)]
    pub format: String,

    /// Reporting frequency, e.g. MENSUELLE
    #[arg(long)]
    pub frequence: String,

    /// Filing deadline as an ISO date, e.g. 2025-01-31
    #[arg(long)]
    pub date_limite: String,

    /// Create the type inactive
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Args, Debug)]
pub struct UpdateDeclarationTypeArgs {
    pub id: i64,

    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub nom: Option<String>,

    #[arg(long)]
    pub format: Option<String>,

    #[arg(long)]
    pub frequence: Option<String>,

    #[arg(long)]
    pub date_limite: Option<String>,
}
