use crate::commands::Context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::Input;
use marquee_config::{Config, EmailProvider};
use marquee_models::Email;
use rand::RngCore;
use serde_json::json;

fn mask_string(s: &str) -> String {
    if s.len() <= 4 {
        return "*".repeat(s.len());
    }
    format!("{}***{}", &s[..2], &s[s.len() - 2..])
}

/// 32 random bytes, hex encoded
pub fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn prompt_admin_emails() -> Result<Vec<String>> {
    let raw: String = Input::new()
        .with_prompt("Admin emails (comma separated)")
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))?;
    Ok(raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

pub fn run_init(mut ctx: Context, admin_emails: Vec<String>, force: bool, output: &Output) -> Result<()> {
    let config_file = ctx.paths.config_file();
    if ctx.config_exists() && !force {
        output.warn(format!(
            "Configuration already exists at {} (use --force to overwrite)",
            config_file.display()
        ));
        return Ok(());
    }

    let admin_emails = if admin_emails.is_empty() {
        prompt_admin_emails()?
    } else {
        admin_emails
    };
    let mut normalized = Vec::with_capacity(admin_emails.len());
    for raw in &admin_emails {
        let email = Email::parse(raw).map_err(|e| eyre!("{}: {}", raw, e))?;
        normalized.push(email.as_str().to_string());
    }

    let mut config = Config::default();
    config.auth.admin_emails = normalized;
    config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
    config
        .save_to_file(&config_file)
        .map_err(|e| eyre!("Failed to write {}: {}", config_file.display(), e))?;
    output.success(format!("Wrote {}", config_file.display()));

    if ctx.secrets.admin_secret().is_none() || force {
        ctx.secrets.set_admin_secret(generate_secret());
        ctx.secrets
            .save()
            .map_err(|e| eyre!("Failed to write secrets: {}", e))?;
        output.success(format!(
            "Generated admin session secret in {}",
            ctx.paths.secrets_file().display()
        ));
    }
    if config.email.provider == EmailProvider::Log {
        output.info("OTP emails are logged, not sent. Set [email] provider = \"resend\" to deliver them.");
    }
    Ok(())
}

pub fn run_show(ctx: &Context, output: &Output) -> Result<()> {
    let config = &ctx.config;
    let secret = ctx.secrets.admin_secret().map(|s| mask_string(&s));
    let resend_key = ctx.secrets.resend_api_key().map(|s| mask_string(&s));

    let rows = vec![
        vec!["Config file".to_string(), ctx.paths.config_file().display().to_string()],
        vec!["Listen".to_string(), config.bind_address()],
        vec!["Secure cookies".to_string(), config.server.secure_cookies.to_string()],
        vec!["Admins".to_string(), config.auth.admin_emails.join(", ")],
        vec!["Session cookie".to_string(), format!("{} ({}s)", config.auth.cookie_name, config.auth.session_ttl_secs)],
        vec![
            "OTP limits".to_string(),
            format!(
                "ttl {}s, cooldown {}s, {} per {}s, {} attempts",
                config.otp.code_ttl_secs,
                config.otp.cooldown_secs,
                config.otp.max_per_window,
                config.otp.window_secs,
                config.otp.max_attempts
            ),
        ],
        vec!["Store".to_string(), format!("{:?}", config.store.backend).to_lowercase()],
        vec!["Email provider".to_string(), format!("{:?}", config.email.provider).to_lowercase()],
        vec!["Admin secret".to_string(), secret.clone().unwrap_or_else(|| "<not set>".to_string())],
        vec!["Resend API key".to_string(), resend_key.clone().unwrap_or_else(|| "<not set>".to_string())],
    ];
    let data = json!({
        "config_file": ctx.paths.config_file(),
        "config": config,
        "admin_secret": secret,
        "resend_api_key": resend_key,
    });
    output.table(&["Setting", "Value"], rows, &data);
    Ok(())
}

pub fn run_validate(ctx: &Context, output: &Output) -> Result<()> {
    if !ctx.config_exists() {
        return Err(eyre!(
            "Configuration file not found at {}",
            ctx.paths.config_file().display()
        ));
    }
    ctx.config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;
    ctx.session_secret()?;
    if ctx.config.email.provider == EmailProvider::Resend && ctx.secrets.resend_api_key().is_none() {
        return Err(eyre!("email.provider is resend but no Resend API key is configured"));
    }
    output.success("Configuration is valid");
    Ok(())
}
