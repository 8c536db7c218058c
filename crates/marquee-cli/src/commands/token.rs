use crate::commands::Context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use marquee_core::{AdminPolicy, SessionSigner};
use marquee_models::Email;
use serde_json::json;
use std::sync::Arc;

/// Mint a session cookie value without the OTP round trip
pub fn run_issue(ctx: &Context, raw_email: &str, output: &Output) -> Result<()> {
    let email = Email::parse(raw_email).map_err(|e| eyre!("{}", e))?;
    let policy = Arc::new(AdminPolicy::new(ctx.config.admin_emails()));
    if !policy.is_admin(&email) {
        return Err(eyre!("{} is not in auth.admin_emails", email));
    }
    let signer = SessionSigner::new(ctx.session_secret()?, policy)?;
    let token = signer.issue(&email)?;

    if output.is_human() {
        output.info(format!("{}={}", ctx.config.auth.cookie_name, token));
    } else {
        output.json(&json!({
            "cookie": ctx.config.auth.cookie_name,
            "token": token,
            "max_age_secs": ctx.config.auth.session_ttl_secs,
        }));
    }
    Ok(())
}
