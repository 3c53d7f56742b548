//! Per-operation timing lines with a thread-local capture sink for deterministic tests.
//! Lines also go to the `salesquery::query` log target, which `logger` routes to `query.log`.

use std::cell::RefCell;

/// Log target for query timing lines.
pub const QUERY_TARGET: &str = "salesquery::query";

thread_local! {
    static TL_SINK: RefCell<Option<Vec<String>>> = const { RefCell::new(None) };
}

/// Disables the thread-local sink on drop.
pub struct DevSinkGuard;
impl Drop for DevSinkGuard {
    fn drop(&mut self) {
        TL_SINK.with(|s| *s.borrow_mut() = None);
    }
}

/// Start capturing lines emitted on the current thread.
pub fn enable_thread_sink() -> DevSinkGuard {
    TL_SINK.with(|s| *s.borrow_mut() = Some(Vec::new()));
    DevSinkGuard
}

pub fn write_str(msg: &str) {
    TL_SINK.with(|s| {
        if let Some(buf) = s.borrow_mut().as_mut() {
            buf.push(msg.to_owned());
        }
    });
}

/// Take the captured lines, leaving the sink enabled and empty.
pub fn drain() -> Vec<String> {
    TL_SINK.with(|s| s.borrow_mut().as_mut().map(std::mem::take).unwrap_or_default())
}

/// Emit one timing line to the query log target and the thread-local sink if enabled.
#[macro_export]
macro_rules! devlog {
    ($($arg:tt)*) => {{
        let __s = format!($($arg)*);
        $crate::utils::devlog::write_str(&__s);
        log::log!(target: $crate::utils::devlog::QUERY_TARGET, log::Level::Debug, "{}", __s);
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_local_sink_captures_messages() {
        let _g = enable_thread_sink();
        crate::devlog!("{{\"op\":\"count\",\"ms\":{}}}", 3);
        crate::devlog!("beta");
        let lines = drain();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"ms\":3"));
        assert!(drain().is_empty());
    }

    #[test]
    fn other_threads_are_not_captured() {
        let _g = enable_thread_sink();
        crate::devlog!("main-thread");
        let child = std::thread::spawn(|| {
            crate::devlog!("child-thread");
            drain()
        })
        .join()
        .unwrap();
        assert!(child.is_empty());
        assert_eq!(drain(), ["main-thread"]);
    }

    #[test]
    fn nothing_is_kept_without_a_sink() {
        crate::devlog!("dropped");
        assert!(drain().is_empty());
    }
}
