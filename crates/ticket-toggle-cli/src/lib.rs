#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use ticket_toggle::{
    ATTR_ACTION, ATTR_DELETED, ATTR_ID, ATTR_TICKET_ID, ActivationReceipt, ANSWER_TOGGLE_CLASS,
    CookieSource, PageRefresher, RecordKind, RefreshError, TICKET_TOGGLE_CLASS, TicketApiClient,
    TicketClientConfig, ToggleController, ToggleElement, csrf_token, normalize_base_url,
};

pub const ENV_ADMIN_COOKIE: &str = "TICKET_ADMIN_COOKIE";

#[derive(Parser, Debug)]
#[command(name = "ticket-toggle")]
#[command(about = "Activate or soft-delete tickets through the support admin API")]
pub struct TicketToggleCli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Flip a record's is_deleted flag, as the admin listing's toggle button does
    Toggle(ToggleArgs),
    /// Soft-delete a record through the API's DELETE endpoint
    Delete(DeleteArgs),
    /// Print the csrftoken value found in a cookie string
    Csrf(CsrfArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConnectionArgs {
    /// Admin server base url. Defaults to TICKET_ADMIN_BASE_URL or the local dev server.
    #[arg(long)]
    pub base_url: Option<String>,
    /// Request timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
    /// Raw cookie string, e.g. "sessionid=...; csrftoken=...". Defaults to TICKET_ADMIN_COOKIE.
    #[arg(long, conflicts_with = "cookie_file")]
    pub cookie: Option<String>,
    /// File holding the raw cookie string; re-read for every request
    #[arg(long)]
    pub cookie_file: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ToggleArgs {
    /// Ticket (or answer) identifier
    #[arg(long)]
    pub id: String,
    /// Button label; only the exact label "Activate" re-activates
    #[arg(long, conflicts_with = "deleted")]
    pub action: Option<String>,
    /// Explicit target state for is_deleted
    #[arg(long)]
    pub deleted: Option<bool>,
    /// Treat --id as an answer of this ticket
    #[arg(long)]
    pub answer_of: Option<String>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub answer_of: Option<String>,
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[derive(clap::Args, Debug)]
pub struct CsrfArgs {
    #[arg(long)]
    pub cookie: String,
}

pub async fn run() -> Result<()> {
    let cli = TicketToggleCli::parse();
    match cli.command {
        Commands::Toggle(args) => run_toggle(args).await,
        Commands::Delete(args) => run_delete(args).await,
        Commands::Csrf(args) => {
            if let Some(token) = csrf_token(&args.cookie) {
                println!("{}", token.as_str());
            }
            Ok(())
        }
    }
}

async fn run_toggle(args: ToggleArgs) -> Result<()> {
    let client = build_client(&args.connection)?;
    let element = toggle_element(&args);
    let refresher = RefetchRefresher {
        client: client.clone(),
        cookies: cookie_source(&args.connection),
    };
    let controller = ToggleController::new(client, cookie_source(&args.connection), refresher);
    controller
        .handle_click(&element)
        .await
        .with_context(|| format!("toggle {}", args.id))?;
    Ok(())
}

async fn run_delete(args: DeleteArgs) -> Result<()> {
    let client = build_client(&args.connection)?;
    let cookies = cookie_source(&args.connection).cookie_string();
    let token = cookies.as_deref().and_then(csrf_token);
    let kind = record_kind(args.answer_of.as_deref());
    let response = client
        .soft_delete(&kind, &args.id, token, cookies)
        .await
        .with_context(|| format!("delete {} {}", kind.as_str(), args.id))?;
    tracing::info!(
        kind = kind.as_str(),
        resource_id = %args.id,
        status = response.status,
        "record soft-deleted"
    );
    println!("{} {} deleted", kind.as_str(), args.id);
    Ok(())
}

fn build_client(connection: &ConnectionArgs) -> Result<TicketApiClient> {
    let mut config = TicketClientConfig::from_env().context("resolve admin configuration")?;
    if let Some(base_url) = connection.base_url.as_deref() {
        config.base_url = normalize_base_url(base_url).context("invalid --base-url")?;
    }
    if let Some(timeout_ms) = connection.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    TicketApiClient::new(config).context("build admin client")
}

fn record_kind(answer_of: Option<&str>) -> RecordKind {
    match answer_of {
        Some(ticket_id) => RecordKind::Answer {
            ticket_id: ticket_id.to_string(),
        },
        None => RecordKind::Ticket,
    }
}

/// Renders the arguments the way the admin listing renders its button.
fn toggle_element(args: &ToggleArgs) -> ToggleElement {
    let mut element = ToggleElement::new().with_attr(ATTR_ID, args.id.as_str());
    element = match args.answer_of.as_deref() {
        Some(ticket_id) => element
            .with_class(ANSWER_TOGGLE_CLASS)
            .with_attr(ATTR_TICKET_ID, ticket_id),
        None => element.with_class(TICKET_TOGGLE_CLASS),
    };
    if let Some(action) = args.action.as_deref() {
        element = element.with_attr(ATTR_ACTION, action);
    }
    if let Some(deleted) = args.deleted {
        element = element.with_attr(ATTR_DELETED, deleted.to_string());
    }
    element
}

fn cookie_source(connection: &ConnectionArgs) -> CliCookies {
    if let Some(path) = connection.cookie_file.clone() {
        return CliCookies::File(path);
    }
    let raw = connection
        .cookie
        .clone()
        .or_else(|| std::env::var(ENV_ADMIN_COOKIE).ok())
        .unwrap_or_default();
    CliCookies::Inline(raw)
}

#[derive(Debug, Clone)]
enum CliCookies {
    Inline(String),
    File(PathBuf),
}

impl CookieSource for CliCookies {
    fn cookie_string(&self) -> Option<String> {
        let raw = match self {
            Self::Inline(raw) => raw.clone(),
            Self::File(path) => match std::fs::read_to_string(path) {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(path = %path.display(), error = %error, "cookie file unreadable");
                    return None;
                }
            },
        };
        let raw = raw.trim().to_string();
        if raw.is_empty() { None } else { Some(raw) }
    }
}

/// Re-renders only the toggled record instead of reloading a page.
struct RefetchRefresher {
    client: TicketApiClient,
    cookies: CliCookies,
}

#[async_trait]
impl PageRefresher for RefetchRefresher {
    async fn refresh(&self, receipt: &ActivationReceipt) -> Result<(), RefreshError> {
        let state = if receipt.is_deleted {
            "inactive"
        } else {
            "active"
        };
        let record = match receipt.record.clone() {
            Some(record) => Some(record),
            None => self
                .client
                .fetch_record(
                    &receipt.kind,
                    &receipt.resource_id,
                    self.cookies.cookie_string(),
                )
                .await
                .map_err(|error| RefreshError::new(error.to_string()))?,
        };

        println!("{} {} is now {state}", receipt.kind.as_str(), receipt.resource_id);
        match record {
            Some(record) => {
                let rendered = serde_json::to_string_pretty(&record)
                    .map_err(|error| RefreshError::new(error.to_string()))?;
                println!("{rendered}");
            }
            None => println!("(record is hidden from the active listing)"),
        }
        Ok(())
    }
}
