use crate::commands::Context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use dialoguer::{Confirm, Input};
use rand::Rng;
use std::io::IsTerminal;

pub async fn run_list(ctx: &Context, output: &Output) -> Result<()> {
    let services = ctx.services(false)?;
    let analytics = services.movies.analytics().await?;

    let rows = analytics
        .iter()
        .map(|a| {
            vec![
                a.movie_id.clone(),
                a.title.clone(),
                format!("{} ({})", a.real_views, a.displayed_views),
                format!("{:.1} x{} ({:.1} x{})", a.real_rating_average, a.real_rating_count, a.displayed_rating, a.displayed_rating_count),
                format!("{:.2}", a.engagement_ratio),
            ]
        })
        .collect();
    output.table(
        &["ID", "Title", "Views (shown)", "Rating (shown)", "Engagement"],
        rows,
        &serde_json::to_value(&analytics)?,
    );
    Ok(())
}

/// Arithmetic challenge in front of destructive bulk operations
fn captcha() -> Result<bool> {
    let mut rng = rand::thread_rng();
    let (a, b): (u32, u32) = (rng.gen_range(1..=10), rng.gen_range(1..=10));
    let answer: String = Input::new()
        .with_prompt(format!("What is {} + {}?", a, b))
        .interact_text()
        .map_err(|e| eyre!("Failed to read input: {}", e))?;
    Ok(answer.trim().parse::<u32>().ok() == Some(a + b))
}

pub async fn run_reset_boosts(ctx: &Context, yes: bool, output: &Output) -> Result<()> {
    if !yes {
        if !std::io::stdin().is_terminal() {
            return Err(eyre!("Refusing to reset boosts non-interactively without --yes"));
        }
        let confirmed = Confirm::new()
            .with_prompt("Reset every movie's view and rating boosts to zero?")
            .default(false)
            .interact()
            .map_err(|e| eyre!("Failed to read confirmation: {}", e))?;
        if !confirmed {
            output.info("Cancelled");
            return Ok(());
        }
        if !captcha()? {
            output.error("Wrong answer; boosts left unchanged");
            return Ok(());
        }
    }

    let services = ctx.services(false)?;
    let reset = services.movies.reset_all_boosts().await?;
    output.success(format!("Reset boosts on {} movie(s)", reset));
    Ok(())
}
