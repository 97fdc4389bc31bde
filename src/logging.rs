//! Leveled logging to stdout and a persistent log file.

use anyhow::Result;
use log::LevelFilter;

pub fn init(level: &str, log_file: &str) -> Result<()> {
    let level = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Info);

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .chain(fern::log_file(log_file)?)
        .apply()?;

    Ok(())
}
