//! A `simplelog` logger that writes one JSON object per record.
//!
//! It plugs into `CombinedLogger` next to the terminal logger, so the log file gets structured
//! lines while stderr keeps the plain format.

use chrono::{Local, SecondsFormat};
use log::{LevelFilter, Log, Metadata, Record};
use serde::Serialize;
use simplelog::{Config, SharedLogger};
use std::io::Write;
use std::sync::Mutex;

#[derive(Debug, Serialize)]
struct LogLine<'a> {
    time: String,
    level: &'a str,
    target: &'a str,
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<u32>,
}

pub struct JsonLogger<W: Write + Send + 'static> {
    level: LevelFilter,
    writable: Mutex<W>,
}

impl<W: Write + Send + 'static> JsonLogger<W> {
    pub fn new(level: LevelFilter, writable: W) -> Box<Self> {
        Box::new(Self {
            level,
            writable: Mutex::new(writable),
        })
    }
}

impl<W: Write + Send + 'static> Log for JsonLogger<W> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = LogLine {
            time: Local::now().to_rfc3339_opts(SecondsFormat::Millis, false),
            level: record.level().as_str(),
            target: record.target(),
            msg: record.args().to_string(),
            file: record.file(),
            line: record.line(),
        };
        // Nowhere to report a failed log write.
        if let Ok(mut writable) = self.writable.lock() {
            if serde_json::to_writer(&mut *writable, &line).is_ok() {
                let _ = writable.write_all(b"\n");
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut writable) = self.writable.lock() {
            let _ = writable.flush();
        }
    }
}

impl<W: Write + Send + 'static> SharedLogger for JsonLogger<W> {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}
