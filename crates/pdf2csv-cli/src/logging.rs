use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const LEVELS: [Level; 4] = [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG];

/// Log level for `verbose` counts of `-v` and `quiet` counts of `-q`.
/// Warnings are shown by default.
pub fn level(verbose: u8, quiet: u8) -> Level {
    let index = (1 + i32::from(verbose) - i32::from(quiet)).clamp(0, 3);
    LEVELS[index as usize]
}

/// Install the stderr subscriber. Called once, before any work starts.
pub fn init(verbose: u8, quiet: u8) {
    FmtSubscriber::builder()
        .with_max_level(level(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}
