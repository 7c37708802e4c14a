use std::env;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Log to the console and to `<who>.log` in `datadir`.  `RUST_LOG` overrides `level_arg`.
pub fn setup_logging<P: AsRef<Path>>(datadir: P, who: &str, level_arg: &str) -> Result<()> {
    use fern::colors::{Color, ColoredLevelConfig};

    let level = env::var("RUST_LOG").unwrap_or(level_arg.to_string());
    let level = log::LevelFilter::from_str(&level)
        .with_context(|| format!("invalid log level {}", level))?;

    // file
    let who_clone = who.to_string();
    let logfile = datadir.as_ref().join(format!("{}.log", who));
    let file_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(
            fern::log_file(&logfile)
                .with_context(|| format!("opening {}", logfile.display()))?,
        );

    // console
    let who_clone = who.to_string();
    let colors = ColoredLevelConfig::new().info(Color::Green).error(Color::Red).warn(Color::Yellow);
    let console_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {}/{} {}] {}",
                tstamp(),
                who_clone,
                record.target(),
                colors.color(record.level()),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout());

    fern::Dispatch::new().chain(console_config).chain(file_config).apply()?;
    Ok(())
}

// UTC, now_local is unsound on some platforms
pub fn tstamp() -> String {
    use time::{macros::format_description, OffsetDateTime};

    OffsetDateTime::now_utc()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_default()
}
