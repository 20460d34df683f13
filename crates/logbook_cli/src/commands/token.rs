use anyhow::Result;
use clap::Args;
use time::Duration;
use uuid::Uuid;

use logbook_api::auth::SessionKeys;
use logbook_api::config::parse_list;
use logbook_core::models::Role;

/// Mints a session token for local development and API testing.
#[derive(Debug, Args)]
pub struct TokenArgs {
    #[arg(long)]
    pub user: String,

    /// STUDENT, FACULTY or HOD
    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub batch: Option<Uuid>,

    /// Lifetime of the token
    #[arg(long, default_value_t = 8)]
    pub hours: i64,

    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Accepted issuers, comma separated, as the API server reads them.
    /// The first one is stamped into the token.
    #[arg(long, env = "SESSION_ISSUERS", default_value = "residency-logbook")]
    pub issuers: String,
}

pub fn mint(args: &TokenArgs) -> Result<String> {
    let keys = SessionKeys::new(&args.secret, &parse_list(&args.issuers));
    Ok(keys.issue_session_token(&args.user, args.role, args.batch, Duration::hours(args.hours))?)
}

pub fn run(args: TokenArgs) -> Result<()> {
    println!("{}", mint(&args)?);
    Ok(())
}
