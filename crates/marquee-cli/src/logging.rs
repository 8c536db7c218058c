use anyhow::Result;
use marquee_config::LoggingConfig;
use std::io;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Filter for the given verbosity; `RUST_LOG` wins when set.
/// 0 = configured level, 1 = debug (hyper quieted), 2+ = trace
fn filter(verbose_level: u8, quiet: bool, default_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    let fallback = match verbose_level {
        0 => default_level,
        1 => "debug,hyper=info,reqwest=info",
        _ => "trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

fn use_json(configured: bool) -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or(configured)
}

/// Split `logs/marquee.log` into the directory and the rotation prefix.
/// The file name is kept whole so rotated files read `marquee.log.<date>`.
fn rotation_target(path: &Path) -> Result<(&Path, &str)> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    Ok((dir, name))
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let registry = Registry::default().with(filter(verbose_level, quiet, &config.level));
    let json = use_json(config.json);

    if let Some(log_path) = &config.file {
        let (dir, name) = rotation_target(log_path)?;
        std::fs::create_dir_all(dir)?;
        // marquee.log.2026-10-16, rotated at midnight UTC
        let appender = RollingFileAppender::new(Rotation::DAILY, dir, name);

        if json {
            registry
                .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(appender))
                .try_init()?;
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_timer(ChronoUtc::rfc_3339())
                        .with_ansi(false)
                        .with_writer(appender),
                )
                .try_init()?;
        }
    } else if json {
        registry
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_timer(ChronoUtc::rfc_3339()).with_writer(io::stderr))
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_target() {
        let (dir, name) = rotation_target(Path::new("/var/log/marquee/marquee.log")).unwrap();
        assert_eq!(dir, Path::new("/var/log/marquee"));
        assert_eq!(name, "marquee.log");

        let (_, dotted) = rotation_target(Path::new("logs/api.v2.log")).unwrap();
        assert_eq!(dotted, "api.v2.log");

        let (_, bare) = rotation_target(Path::new("/tmp/server")).unwrap();
        assert_eq!(bare, "server");
    }
}
