pub use log::LevelFilter::*;

/// Install the global logger. Hosts call this once during setup; a second call
/// reports the already-installed logger as an error.
pub fn setup_logging(verbosity: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    fern::Dispatch::new()
        .level(verbosity)
        .format(|out, message, record| out.finish(format_args!("({}) {}: {}", record.level(), record.target(), message)))
        .chain(std::io::stdout())
        .apply()
}
