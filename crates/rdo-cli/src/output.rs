use rdo_core::models::{Severity, StatusEvent};
use tokio::sync::mpsc;

pub fn info(message: &str) {
    println!("INFO     {message}");
}

pub fn success(message: &str) {
    println!("SUCCESS  {message}");
}

pub fn warning(message: &str) {
    eprintln!("WARNING  {message}");
}

pub fn error(message: &str) {
    eprintln!("ERROR    {message}");
}

pub fn print_event(event: &StatusEvent) {
    match event.severity {
        Severity::Info => info(&event.message),
        Severity::Success => success(&event.message),
        Severity::Warning => warning(&event.message),
        Severity::Error => error(&event.message),
    }
}

/// Channel the engine's status events into prefixed stdout/stderr lines.
/// Drop every sender, then await the handle to flush.
pub fn spawn_printer() -> (
    mpsc::UnboundedSender<StatusEvent>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });
    (tx, handle)
}
