//! Session token minting for local development and scripting.

use anyhow::Context;
use clap::Args;
use uuid::Uuid;

use charisma_auth::JwtEncoder;
use charisma_core::config::AppConfig;
use charisma_entity::user::UserRole;

/// Arguments for the token command
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// User id; a random one is generated when omitted
    #[arg(short, long)]
    pub user_id: Option<Uuid>,
    /// Role: ADMIN or USER
    #[arg(short, long, default_value = "USER")]
    pub role: UserRole,
    /// Display name
    #[arg(short, long, default_value = "cli")]
    pub name: String,
}

/// Print a token signed with `auth.jwt_secret`.
pub fn execute(args: &TokenArgs, config: &AppConfig) -> anyhow::Result<()> {
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    let token = JwtEncoder::new(&config.auth)
        .issue(user_id, args.role, &args.name)
        .context("Failed to sign token")?;
    tracing::debug!(%user_id, role = %args.role, "Token issued");
    println!("{}", token);
    Ok(())
}
