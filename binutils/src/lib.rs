//! Shared helpers for the command line tools in this workspace: clap styling,
//! verbosity flags and tracing subscriber setup.

use std::{io, sync::Mutex};

pub use clap;
pub use clap_verbosity_flag as verbose;

use clap::builder::styling::{AnsiColor, Effects, Styles};

/// Styles used by every binary's `--help` output.
pub fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Translate the level selected by the `-v`/`-q` flags into the max level of
/// the tracing subscriber. Fully quiet still reports errors.
pub fn verbose_level_to_trace(level: Option<verbose::Level>) -> &'static tracing::Level {
    match level {
        Some(verbose::Level::Error) => &tracing::Level::ERROR,
        Some(verbose::Level::Warn) => &tracing::Level::WARN,
        Some(verbose::Level::Info) => &tracing::Level::INFO,
        Some(verbose::Level::Debug) => &tracing::Level::DEBUG,
        Some(verbose::Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr in compact form, or to `file` as JSON lines when given.
/// Calling this more than once keeps the first subscriber.
pub fn logging_setup<W>(level: &tracing::Level, file: Option<W>)
where
    W: io::Write + Send + 'static,
{
    let builder = tracing_subscriber::fmt().with_max_level(*level);
    let _ = match file {
        Some(file) => builder
            .json()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => builder
            .compact()
            .with_target(false)
            .with_writer(io::stderr)
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Args {
        #[command(flatten)]
        verbose: verbose::Verbosity<verbose::InfoLevel>,
    }

    #[test]
    fn test_verbosity_mapping() {
        let level = |argv: &[&str]| {
            let args = Args::parse_from(argv);
            *verbose_level_to_trace(args.verbose.log_level())
        };
        assert_eq!(level(&["bin"]), tracing::Level::INFO);
        assert_eq!(level(&["bin", "-vv"]), tracing::Level::TRACE);
        assert_eq!(level(&["bin", "-q"]), tracing::Level::WARN);
        assert_eq!(level(&["bin", "-qqqq"]), tracing::Level::ERROR);
    }

    #[test]
    fn test_logging_to_file() -> std::io::Result<()> {
        let file = tempfile::tempfile()?;
        logging_setup(&tracing::Level::DEBUG, Some(file));
        tracing::debug!("logging to a temp file");
        // a second call must not panic
        logging_setup(&tracing::Level::DEBUG, None::<std::fs::File>);
        Ok(())
    }
}
