//! Log setup for the `twins` binary.
//!
//! `RUST_LOG` wins when set. Otherwise `--quiet` shows errors only, the
//! default is info, `-v` is debug and `-vv` is trace.

use std::env;
use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Install the global logger. Call once, before any log output.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let level = record.level();
        let level_style = buf.default_level_style(level);
        if verbose > 0 {
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} [{}] {}",
                level,
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else if level <= log::Level::Warn {
            writeln!(buf, "{level_style}{:<5}{level_style:#} {}", level, record.args())
        } else {
            writeln!(buf, "{}", record.args())
        }
    });

    builder.init();
    log::debug!("Logging initialized at level {:?}", log::max_level());
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
