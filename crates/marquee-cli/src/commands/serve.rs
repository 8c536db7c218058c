use crate::commands::Context;
use crate::output::Output;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use marquee_core::OtpService;
use marquee_server::{build_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Cron job that drops expired OTP records
pub struct OtpSweeper {
    scheduler: JobScheduler,
}

impl OtpSweeper {
    pub async fn start(otp: Arc<OtpService>, schedule: &str) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| eyre!("Failed to create scheduler: {:?}", e))?;

        let job = Job::new_async(schedule, move |_id, _scheduler| {
            let otp = otp.clone();
            Box::pin(async move {
                match otp.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => info!(operation = "otp_sweep", purged, "Expired OTPs removed"),
                    Err(e) => error!(operation = "otp_sweep", error = %e, "OTP sweep failed"),
                }
            })
        })
        .map_err(|e| eyre!("Invalid OTP sweep schedule '{}': {:?}", schedule, e))?;

        scheduler
            .add(job)
            .await
            .map_err(|e| eyre!("Failed to schedule OTP sweep: {:?}", e))?;
        scheduler
            .start()
            .await
            .map_err(|e| eyre!("Failed to start scheduler: {:?}", e))?;

        info!(operation = "scheduler_started", schedule, "OTP sweep scheduled");
        Ok(Self { scheduler })
    }

    pub async fn shutdown(mut self) {
        if let Err(e) = self.scheduler.shutdown().await {
            error!(error = ?e, "Scheduler did not shut down cleanly");
        }
    }
}

pub async fn run_serve(
    mut ctx: Context,
    bind: Option<String>,
    port: Option<u16>,
    no_scheduler: bool,
    output: &Output,
) -> Result<()> {
    if !ctx.config_exists() {
        output.warn(format!(
            "No configuration at {}; run 'marquee config init' first",
            ctx.paths.config_file().display()
        ));
    }
    if let Some(bind) = bind {
        ctx.config.server.bind = bind;
    }
    if let Some(port) = port {
        ctx.config.server.port = port;
    }
    ctx.config
        .validate()
        .map_err(|e| eyre!("Configuration validation failed: {}", e))?;

    let services = ctx.services(true)?;
    let sweeper = if ctx.config.scheduler.enabled && !no_scheduler {
        Some(OtpSweeper::start(services.otp.clone(), &ctx.config.scheduler.otp_sweep_schedule).await?)
    } else {
        None
    };

    let address = ctx.config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", address))?;
    output.success(format!("Serving on http://{}", address));
    info!(
        operation = "serve",
        address = %address,
        admins = services.signer.policy().len(),
        secure_cookies = ctx.config.server.secure_cookies,
        "Server starting"
    );

    let router = build_router(AppState::new(services, &ctx.config), &ctx.config.server.cors_origins);
    let served = marquee_server::serve(listener, router).await;

    if let Some(sweeper) = sweeper {
        sweeper.shutdown().await;
    }
    served.wrap_err("Server error")?;
    output.info("Server stopped");
    Ok(())
}
