//! Tracing output for the browser console.

use std::io::{self, Write};

use tracing_subscriber::{fmt, EnvFilter};

/// Writer that collects one formatted event and emits it as a single
/// console line when flushed or dropped.
#[derive(Debug, Default)]
pub(crate) struct ConsoleWriter {
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn take_line(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&bytes);
        Some(line.trim_end_matches('\n').to_string())
    }
}

impl Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(line) = self.take_line() {
            emit(&line);
        }
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(line: &str) {
    web_sys::console::log_1(&line.into());
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(line: &str) {
    eprintln!("{}", line);
}

/// Install the console subscriber.
///
/// `level` is an env-filter directive such as `"debug"` or
/// `"portrait_core=trace"`; invalid directives fall back to `info`. Returns
/// false if a subscriber was already installed.
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(ConsoleWriter::default)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_buffers_until_flush() {
        let mut writer = ConsoleWriter::default();
        writer.write_all(b"INFO edit ").unwrap();
        writer.write_all(b"applied\n").unwrap();
        assert_eq!(writer.take_line().as_deref(), Some("INFO edit applied"));
        assert!(writer.take_line().is_none());
    }

    #[test]
    fn test_flush_empties_buffer() {
        let mut writer = ConsoleWriter::default();
        writer.write_all(b"line\n").unwrap();
        writer.flush().unwrap();
        assert!(writer.buf.is_empty());
    }

    #[test]
    fn test_invalid_level_still_installs_once() {
        // Only the second call is guaranteed to find a default already set
        let _ = init_logging("not a [valid directive");
        assert!(!init_logging("debug"));
    }
}
