/*! File logging.

Sets up `fern` to append timestamped lines to a log file for the
process lifetime, in the `YYYY-MM-DD HH:MM:SS - LEVEL - message` format
§6 specifies. Grounded on the teacher's `stderrlog`-based setup in
`examples/ax25-1200-rx.rs` for the overall "configure once in `main`"
shape, with the format itself taken from
`examples/original_source/utils/log_setup.py`'s first logging
configuration variant (`'%(asctime)s - %(levelname)s - %(message)s'`,
`datefmt='%Y-%m-%d %H:%M:%S'`).
*/
use std::path::Path;

use anyhow::Context;

/// Open `path` in append mode and install it as the `log` backend,
/// flushed on every record (`fern`'s default for a `File`-backed
/// dispatcher chained without explicit buffering).
pub fn init(path: &Path, verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                message
            ));
        })
        .level(level)
        .chain(
            fern::log_file(path)
                .with_context(|| format!("opening log file {}", path.display()))?,
        )
        .apply()
        .context("installing logger")?;
    Ok(())
}
