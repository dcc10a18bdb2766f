// app/src/notify.rs

//! Fire-and-forget user notices ("toasts").

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Success,
  Info,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub severity: Severity,
  pub message: String,
}

pub trait Notifier: Send + Sync {
  fn notify(&self, severity: Severity, message: &str);
}

/// Collects notices so they can be returned with an HTTP response or asserted in tests.
#[derive(Debug, Default)]
pub struct NoticeBuffer {
  notices: Mutex<Vec<Notice>>,
}

impl NoticeBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().clone()
  }

  pub fn take(&self) -> Vec<Notice> {
    std::mem::take(&mut *self.notices.lock())
  }

  pub fn messages(&self) -> Vec<String> {
    self.notices.lock().iter().map(|n| n.message.clone()).collect()
  }
}

impl Notifier for NoticeBuffer {
  fn notify(&self, severity: Severity, message: &str) {
    self.notices.lock().push(Notice {
      severity,
      message: message.to_string(),
    });
  }
}

/// Writes notices to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, severity: Severity, message: &str) {
    match severity {
      Severity::Error => error!(target: "notices", "{}", message),
      Severity::Success | Severity::Info => info!(target: "notices", ?severity, "{}", message),
    }
  }
}
