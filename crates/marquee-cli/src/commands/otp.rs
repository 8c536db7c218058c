use crate::commands::Context;
use crate::output::Output;
use color_eyre::Result;

pub async fn run_purge(ctx: &Context, output: &Output) -> Result<()> {
    let services = ctx.services(false)?;
    let purged = services.otp.purge_expired().await?;
    output.success(format!("Removed {} expired OTP record(s)", purged));
    Ok(())
}
