// Debug capture: timestamped diagnostics echoed to stderr and kept in memory
use chrono::Local;
use lazy_static::lazy_static;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::MAX_DEBUG_LOGS;

lazy_static! {
    pub static ref DEBUG_BUFFER: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
}

static ECHO: AtomicBool = AtomicBool::new(true);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Info,
    Warn,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

/// Record a message in the buffer and, unless muted, on stderr
pub fn debug_print(level: Level, msg: String) {
    let formatted = format!("[{}] {}: {}", Local::now().format("%H:%M:%S%.3f"), level.tag(), msg);

    if ECHO.load(Ordering::Relaxed) {
        eprintln!("{}", formatted);
    }

    if let Ok(mut buffer) = DEBUG_BUFFER.lock() {
        buffer.push(formatted);
        if buffer.len() > MAX_DEBUG_LOGS {
            let excess = buffer.len() - MAX_DEBUG_LOGS;
            buffer.drain(0..excess);
        }
    }
}

/// Toggle the stderr echo; messages are still buffered when off
pub fn set_echo(enabled: bool) {
    ECHO.store(enabled, Ordering::Relaxed);
}

pub fn get_debug_messages() -> Vec<String> {
    if let Ok(buffer) = DEBUG_BUFFER.lock() {
        buffer.clone()
    } else {
        Vec::new()
    }
}

#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::debug_capture::debug_print($crate::debug_capture::Level::Info, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        $crate::debug_capture::debug_print($crate::debug_capture::Level::Trace, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_warn {
    ($($arg:tt)*) => {
        $crate::debug_capture::debug_print($crate::debug_capture::Level::Warn, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_error {
    ($($arg:tt)*) => {
        $crate::debug_capture::debug_print($crate::debug_capture::Level::Error, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_timing {
    ($name:expr, $start:expr) => {
        $crate::debug_capture::debug_print(
            $crate::debug_capture::Level::Trace,
            format!("TIMING: {} took {:?}", $name, $start.elapsed()),
        )
    };
}
