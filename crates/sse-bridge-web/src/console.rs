//! `log` output to the browser console.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error | Level::Warn => {
                zoon::eprintln!("[sse-bridge] {} {}", record.level(), record.args())
            }
            _ => zoon::println!("[sse-bridge] {} {}", record.level(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// Install the console logger. A logger installed earlier (by the embedding
/// app) wins; only the max level is applied then.
pub fn init(level: LevelFilter) {
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
