use std::sync::Once;

use crate::util::config;

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Hosts embedding the staticlib usually only capture stderr; keep it terse.
        eprintln!("[inkfill {}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;
static INIT: Once = Once::new();

/// Install the console logger once, at the level from `inkfill.cfg`.
///
/// A logger already installed by the host wins; only the max level is applied then.
pub fn init_logger() {
    INIT.call_once(|| {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(config::ink_config().log_level);
    });
}
