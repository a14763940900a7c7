use chrono::Local;
use env_logger::Builder;
use std::io::Write;

/// Initialise the process logger. `filter` takes the usual RUST_LOG syntax;
/// the CLI `--debug` flag maps to "debug".
pub fn init(filter: &str) {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .parse_filters(filter);
    // Ignore double-init so tests can call this freely.
    let _ = builder.try_init();
}
