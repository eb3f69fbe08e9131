use tracing::info;

/// Delivers a batch report to whoever watches the loader.
pub trait Notifier {
    fn notify(&self, subject: &str, body: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, subject: &str, body: &str) {
        info!(subject, "{}", body);
    }
}
