// std
use std::backtrace::{Backtrace, BacktraceStatus};
use std::panic::PanicHookInfo;

/// Reports panics through the installed subscriber instead of stderr.
pub fn panic_hook(info: &PanicHookInfo) {
    let payload = info.payload();
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str));
    let location = info.location().map(ToString::to_string);
    let backtrace = Backtrace::capture();
    let note = (backtrace.status() == BacktraceStatus::Disabled)
        .then_some("run with RUST_BACKTRACE=1 to display a backtrace");

    tracing::error!(
        panic.payload = message,
        panic.location = location,
        panic.backtrace = %backtrace,
        panic.note = note,
        "A panic occurred",
    );
}
