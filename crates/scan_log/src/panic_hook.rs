//! Panic hook for crash reporting

use backtrace::Backtrace;
use chrono::Local;
use std::panic::PanicHookInfo;

/// Initialize the panic hook for crash reporting
///
/// Panics on threads named in `contained_threads` are caught by their owner
/// and only logged; every other panic produces a crash dump.
pub fn init_panic_hook(contained_threads: &'static [&'static str]) {
    std::panic::set_hook(Box::new(move |info: &PanicHookInfo| {
        panic_handler(info, contained_threads)
    }));
    tracing::debug!("Panic hook initialized");
}

fn panic_handler(info: &PanicHookInfo, contained_threads: &[&str]) {
    let thread = std::thread::current();
    let name = thread.name().unwrap_or("<unnamed>");
    let location = format!("{:?}", info.location());

    if is_contained(thread.name(), contained_threads) {
        tracing::warn!(
            "Contained panic on thread {} at {}: {}",
            name,
            location,
            payload_message(info)
        );
        return;
    }

    let report = crash_report(name, &location, payload_message(info), &Backtrace::new());

    eprintln!("{}", report);
    tracing::error!("{}", report);

    let dump_path = std::env::temp_dir().join(format!(
        "dirscan_crash_{}.txt",
        Local::now().format("%Y%m%d_%H%M%S")
    ));

    if let Err(e) = std::fs::write(&dump_path, &report) {
        eprintln!("Failed to write crash dump: {}", e);
    }
}

fn is_contained(thread: Option<&str>, contained_threads: &[&str]) -> bool {
    thread.is_some_and(|name| contained_threads.contains(&name))
}

/// Extract the panic message from either payload type `panic!` produces
fn payload_message<'a>(info: &'a PanicHookInfo) -> &'a str {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("<unknown>")
}

fn crash_report(thread: &str, location: &str, payload: &str, backtrace: &Backtrace) -> String {
    format!(
        "=== CRITICAL PANIC ===\n\
         Timestamp: {}\n\
         Thread: {}\n\
         Location: {}\n\
         Payload: {}\n\n\
         Stack Trace:\n{:?}",
        Local::now().to_rfc3339(),
        thread,
        location,
        payload,
        backtrace
    )
}
