//! Command execution.
//!
//! Every data command first navigates to the screen that owns it, so the
//! route guard decides exactly as it would for the web console.

use std::sync::Arc;

use anyhow::{Context, Result};
use bct_admin_client::{
    AdminClient, CreateDeclarationTypeRequest, CreateUserRequest, DeclarationType, KeycloakUser,
    RoleDto, UpdateUserRequest,
};
use bct_auth_core::{Role, SessionContext, TokenSource};
use bct_console_routing::{Layout, NavigationOutcome, PageInfo, Router};
use bct_identity_keycloak::{
    AuthorizationCallback, FileSessionStore, KeycloakClient, Redirector, SessionProvider,
};
use tracing::debug;
use url::Url;

use crate::cli::{
    CallbackArgs, Command, DeclarationTypesCommand, RolesCommand, UpdateDeclarationTypeArgs,
    UsersCommand,
};
use crate::config::ConsoleConfig;

const USER_MANAGEMENT: &str = "/user-management";
const DECLARATION_TYPE_MANAGEMENT: &str = "/declaration-type-management";

/// Prints provider URLs for the user to open in a browser.
pub struct PrintRedirector;

impl Redirector for PrintRedirector {
    fn redirect(&self, target: &Url) {
        println!("Open this URL in your browser:\n\n  {}\n", target);
    }
}

/// A bootstrapped console: initialized session, router and backend client.
pub struct Console {
    config: ConsoleConfig,
    session: Arc<SessionProvider>,
    router: Router<SessionProvider>,
    admin: AdminClient,
}

impl Console {
    /// Runs the session handshake and wires the router and admin client to
    /// the resulting session.
    pub async fn bootstrap(config: ConsoleConfig, redirector: Arc<dyn Redirector>) -> Result<Self> {
        let identity = KeycloakClient::new(config.identity.clone())
            .context("Failed to create identity provider client")?;
        let store = FileSessionStore::new(config.session_store_path()?);
        debug!(path = %store.path().display(), "Using session store");

        let session = SessionProvider::initialize(
            Arc::new(identity),
            Arc::new(store),
            redirector,
            config.init_options(),
        )
        .await;

        let tokens: Arc<dyn TokenSource> = session.clone();
        let admin = AdminClient::builder(config.backend.url.clone())
            .with_timeout(config.backend_timeout())
            .with_token_source(tokens)
            .build()
            .context("Failed to create admin API client")?;

        Ok(Self {
            router: Router::new(session.clone()),
            session,
            admin,
            config,
        })
    }

    pub fn session(&self) -> &SessionProvider {
        &self.session
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Login => self.login(),
            Command::Callback(args) => self.callback(args).await,
            Command::Register => {
                self.session
                    .register()
                    .context("Failed to start registration")?;
                Ok(())
            }
            Command::Logout => {
                self.session.logout(&self.config.identity.redirect_uri);
                println!("Logged out");
                Ok(())
            }
            Command::Whoami => {
                self.whoami();
                Ok(())
            }
            Command::Navigate { path } => self.navigate(&path),
            Command::Users(command) => self.users(command).await,
            Command::Roles(command) => self.roles(command).await,
            Command::DeclarationTypes(command) => self.declaration_types(command).await,
        }
    }

    fn login(&self) -> Result<()> {
        if let Some(username) = self.session.current_username() {
            println!("Already logged in as {}", username);
            return Ok(());
        }
        self.session.begin_login().context("Failed to start login")?;
        println!("Then run `bct-console callback --url <redirected URL>`");
        Ok(())
    }

    async fn callback(&self, args: CallbackArgs) -> Result<()> {
        let callback = match (args.url, args.code, args.state) {
            (Some(url), _, _) => {
                let url = Url::parse(&url).context("Invalid redirect URL")?;
                AuthorizationCallback::from_redirect_url(&url)
                    .context("Redirect URL has no state parameter")?
            }
            (None, Some(code), Some(state)) => AuthorizationCallback::new(code, state),
            _ => anyhow::bail!("Pass either --url or both --code and --state"),
        };

        self.session
            .handle_callback(&callback)
            .await
            .context("Login failed")?;
        self.whoami();
        Ok(())
    }

    fn whoami(&self) {
        let session = self.session.session();
        let Some(claims) = session.claims.as_ref().filter(|_| session.authenticated) else {
            println!("Not logged in");
            return;
        };

        println!(
            "Logged in as {}",
            claims.preferred_username.as_deref().unwrap_or("<unknown>")
        );
        if let Some(email) = &claims.email {
            println!("  email:   {}", email);
        }
        let roles: Vec<&str> = session.realm_roles.iter().map(Role::display_name).collect();
        println!("  roles:   {}", roles.join(", "));
        if let Some(tokens) = &session.tokens {
            println!("  expires: {}", tokens.expires_at.to_rfc3339());
        }
    }

    fn navigate(&mut self, path: &str) -> Result<()> {
        let nav = self.router.navigate(path);
        match nav.outcome {
            NavigationOutcome::Rendered(screen) => {
                println!("{} -> {:?}", nav.location, screen);
                self.print_page_header();
                Ok(())
            }
            NavigationOutcome::Fallback => {
                println!("No route for {}, showing {}", nav.requested, nav.location);
                Ok(())
            }
            NavigationOutcome::LoginRedirect => {
                anyhow::bail!("Login required to open {}", nav.requested)
            }
            NavigationOutcome::Unauthorized => {
                anyhow::bail!(
                    "Access denied to {}: your roles do not allow this page",
                    nav.requested
                )
            }
        }
    }

    /// Opens the screen a command belongs to, failing when the guard refuses.
    fn enter(&mut self, path: &str) -> Result<()> {
        let nav = self.router.navigate(path);
        if nav.is_rendered() {
            self.print_page_header();
            return Ok(());
        }
        match nav.outcome {
            NavigationOutcome::LoginRedirect => {
                anyhow::bail!("Login required: open the URL above, then run `bct-console callback`")
            }
            outcome => anyhow::bail!("Cannot open {}: {}", path, outcome),
        }
    }

    fn print_page_header(&self) {
        let Some(route) = self.router.current_route() else {
            return;
        };
        if route.layout == Some(Layout::Dashboard) {
            let page = PageInfo::for_path(&route.path);
            println!("== {} ==\n{}\n", page.title, page.subtitle);
        }
    }

    async fn users(&mut self, command: UsersCommand) -> Result<()> {
        self.enter(USER_MANAGEMENT)?;
        let admin = &self.admin;

        match command {
            UsersCommand::List => print_users(&admin.list_users().await?),
            UsersCommand::Get { id } => print_user_detail(&admin.get_user(&id).await?),
            UsersCommand::Search { query } => print_users(&admin.search_users(&query).await?),
            UsersCommand::Create(args) => {
                let request = CreateUserRequest {
                    username: args.username,
                    email: args.email,
                    first_name: args.first_name,
                    last_name: args.last_name,
                    password: args.password,
                    enabled: !args.disabled,
                    roles: parse_roles(&args.roles),
                };
                let ack = admin.create_user(request).await?;
                print_ack(ack.message.as_deref(), "User created");
                if let Some(id) = ack.user_id {
                    println!("id: {}", id);
                }
            }
            UsersCommand::Update(args) => {
                let update = UpdateUserRequest {
                    username: args.username,
                    email: args.email,
                    first_name: args.first_name,
                    last_name: args.last_name,
                    ..Default::default()
                };
                if update.is_empty() {
                    anyhow::bail!("Nothing to update");
                }
                let ack = admin.update_user(&args.id, &update).await?;
                print_ack(ack.message.as_deref(), "User updated");
            }
            UsersCommand::Delete { id } => {
                let ack = admin.delete_user(&id).await?;
                print_ack(ack.message.as_deref(), "User deleted");
            }
            UsersCommand::Enable { id } => {
                let ack = admin.set_user_status(&id, true).await?;
                print_ack(ack.message.as_deref(), "User enabled");
            }
            UsersCommand::Disable { id } => {
                let ack = admin.set_user_status(&id, false).await?;
                print_ack(ack.message.as_deref(), "User disabled");
            }
            UsersCommand::ResetPassword { id } => {
                let ack = admin.send_password_reset(&id).await?;
                print_ack(ack.message.as_deref(), "Password reset email sent");
            }
            UsersCommand::Roles { id } => print_roles(&admin.get_user_roles(&id).await?),
            UsersCommand::AssignRole { id, roles } => {
                let ack = admin.assign_roles(&id, &parse_roles(&roles)).await?;
                print_ack(ack.message.as_deref(), "Roles assigned");
            }
            UsersCommand::RemoveRole { id, roles } => {
                let ack = admin.remove_roles(&id, &parse_roles(&roles)).await?;
                print_ack(ack.message.as_deref(), "Roles removed");
            }
            UsersCommand::ByRole { role } => {
                print_users(&admin.users_by_role(&Role::from(role.as_str())).await?)
            }
        }
        Ok(())
    }

    async fn roles(&mut self, command: RolesCommand) -> Result<()> {
        self.enter(USER_MANAGEMENT)?;
        match command {
            RolesCommand::List => print_roles(&self.admin.list_roles().await?),
        }
        Ok(())
    }

    async fn declaration_types(&mut self, command: DeclarationTypesCommand) -> Result<()> {
        self.enter(DECLARATION_TYPE_MANAGEMENT)?;
        let admin = &self.admin;

        match command {
            DeclarationTypesCommand::List => {
                print_declaration_types(&admin.list_declaration_types().await?)
            }
            DeclarationTypesCommand::Create(args) => {
                let request = CreateDeclarationTypeRequest {
                    code: args.code,
                    nom: Some(args.nom),
                    format: Some(args.format),
                    frequence: Some(args.frequence),
                    date_limite: Some(args.date_limite),
                    actif: !args.inactive,
                };
                let created = admin.create_declaration_type(&request).await?;
                print_declaration_types(std::slice::from_ref(&created));
            }
            DeclarationTypesCommand::Update(args) => {
                let current = admin
                    .list_declaration_types()
                    .await?
                    .into_iter()
                    .find(|d| d.id == Some(args.id))
                    .with_context(|| format!("Declaration type {} not found", args.id))?;
                let updated = admin
                    .update_declaration_type(args.id, &apply_update(current, args))
                    .await?;
                print_declaration_types(std::slice::from_ref(&updated));
            }
            DeclarationTypesCommand::Delete { id } => {
                let ack = admin.delete_declaration_type(id).await?;
                print_ack(ack.message.as_deref(), "Declaration type deleted");
            }
            DeclarationTypesCommand::Toggle { id } => {
                let toggled = admin.toggle_declaration_type(id).await?;
                println!(
                    "{} is now {}",
                    toggled.code,
                    if toggled.actif { "active" } else { "inactive" }
                );
            }
        }
        Ok(())
    }
}

fn parse_roles(names: &[String]) -> Vec<Role> {
    names.iter().map(|name| Role::from(name.as_str())).collect()
}

fn apply_update(mut current: DeclarationType, args: UpdateDeclarationTypeArgs) -> DeclarationType {
    if let Some(code) = args.code {
        current.code = code;
    }
    if args.nom.is_some() {
        current.nom = args.nom;
    }
    if args.format.is_some() {
        current.format = args.format;
    }
    if args.frequence.is_some() {
        current.frequence = args.frequence;
    }
    if args.date_limite.is_some() {
        current.date_limite = args.date_limite;
    }
    current
}

fn print_ack(message: Option<&str>, fallback: &str) {
    println!("{}", message.unwrap_or(fallback));
}

fn print_users(users: &[KeycloakUser]) {
    if users.is_empty() {
        println!("No users");
        return;
    }
    println!(
        "{:<38} {:<20} {:<30} {:<8} ROLES",
        "ID", "USERNAME", "EMAIL", "ENABLED"
    );
    for user in users {
        println!(
            "{:<38} {:<20} {:<30} {:<8} {}",
            user.id.as_deref().unwrap_or("-"),
            user.username,
            user.email,
            if user.enabled { "yes" } else { "no" },
            user.display_roles().join(", ")
        );
    }
}

fn print_user_detail(user: &KeycloakUser) {
    println!("{} ({})", user.username, user.id.as_deref().unwrap_or("-"));
    println!("  name:     {}", user.full_name());
    println!("  email:    {}", user.email);
    println!("  enabled:  {}", user.enabled);
    if let Some(verified) = user.email_verified {
        println!("  verified: {}", verified);
    }
    println!("  roles:    {}", user.display_roles().join(", "));
}

fn print_roles(roles: &[RoleDto]) {
    for role in roles {
        match &role.description {
            Some(description) => println!("{:<20} {}", role.name.display_name(), description),
            None => println!("{}", role.name.display_name()),
        }
    }
}

fn print_declaration_types(types: &[DeclarationType]) {
    if types.is_empty() {
        println!("No declaration types");
        return;
    }
    println!(
        "{:<5} {:<12} {:<36} {:<8} {:<12} {:<10} ACTIF",
        "ID", "CODE", "NOM", "FORMAT", "FREQUENCE", "LIMITE"
    );
    for d in types {
        println!(
            "{:<5} {:<12} {:<36} {:<8} {:<12} {:<10} {}",
            d.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
            d.code,
            d.nom.as_deref().unwrap_or("-"),
            d.format.as_deref().unwrap_or("-"),
            d.frequence.as_deref().unwrap_or("-"),
            d.date_limite.as_deref().unwrap_or("-"),
            if d.actif { "oui" } else { "non" }
        );
    }
}
