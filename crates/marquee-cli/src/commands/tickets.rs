use crate::commands::Context;
use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use marquee_core::tickets::write_csv;
use marquee_models::Ticket;
use std::fs::File;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

fn ticket_rows(tickets: &[Ticket]) -> Vec<Vec<String>> {
    tickets
        .iter()
        .map(|t| {
            vec![
                t.code.to_string(),
                if t.used { "yes".to_string() } else { "no".to_string() },
                t.used_by.clone().unwrap_or_default(),
                t.used_at.map(|d| d.to_rfc3339()).unwrap_or_default(),
                t.created_at.to_rfc3339(),
            ]
        })
        .collect()
}

const HEADER: [&str; 5] = ["Code", "Used", "Used by", "Used at", "Created"];

pub async fn run_generate(ctx: &Context, premiere_id: &str, count: u32, output: &Output) -> Result<()> {
    let services = ctx.services(false)?;

    let spinner = if output.is_human() && std::io::stderr().is_terminal() {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .map_err(|e| eyre!("Invalid progress template: {}", e))?,
        );
        spinner.set_message(format!("Generating {} ticket(s)...", count));
        spinner.enable_steady_tick(Duration::from_millis(100));
        Some(spinner)
    } else {
        None
    };

    let result = services.tickets.generate(premiere_id, count).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let tickets = result?;

    output.success(format!("Generated {} ticket(s) for {}", tickets.len(), premiere_id));
    output.table(&HEADER, ticket_rows(&tickets), &serde_json::to_value(&tickets)?);
    Ok(())
}

pub async fn run_list(ctx: &Context, premiere_id: &str, output: &Output) -> Result<()> {
    let services = ctx.services(false)?;
    let tickets = services.tickets.list(premiere_id).await?;
    let used = tickets.iter().filter(|t| t.used).count();
    output.table(&HEADER, ticket_rows(&tickets), &serde_json::to_value(&tickets)?);
    output.info(format!("{} ticket(s), {} used", tickets.len(), used));
    Ok(())
}

pub async fn run_export(ctx: &Context, premiere_id: &str, out: Option<PathBuf>, output: &Output) -> Result<()> {
    let services = ctx.services(false)?;
    let tickets = services.tickets.list(premiere_id).await?;

    let path = out.unwrap_or_else(|| ctx.paths.exports_dir().join(format!("tickets-{}.csv", premiere_id)));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
    }
    let file = File::create(&path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
    write_csv(&tickets, file)?;

    output.success(format!("Exported {} ticket(s) to {}", tickets.len(), path.display()));
    Ok(())
}
