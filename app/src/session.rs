// app/src/session.rs

//! The caller's identity and notice channel, passed explicitly into every operation.

use crate::errors::{AppError, Result};
use crate::notify::{Notifier, Severity, TracingNotifier};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CurrentUser {
  pub user_id: Uuid,
}

#[derive(Clone)]
pub struct RequestContext {
  pub user: Option<CurrentUser>,
  pub notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RequestContext").field("user", &self.user).finish_non_exhaustive()
  }
}

impl RequestContext {
  pub fn new(user: Option<CurrentUser>, notifier: Arc<dyn Notifier>) -> Self {
    Self { user, notifier }
  }

  pub fn signed_in(user_id: Uuid, notifier: Arc<dyn Notifier>) -> Self {
    Self::new(Some(CurrentUser { user_id }), notifier)
  }

  pub fn anonymous(notifier: Arc<dyn Notifier>) -> Self {
    Self::new(None, notifier)
  }

  /// A context for background work: no user, notices go to the log.
  pub fn system() -> Self {
    Self::anonymous(Arc::new(TracingNotifier))
  }

  pub fn require_user(&self) -> Result<CurrentUser> {
    self
      .user
      .ok_or_else(|| AppError::Unauthenticated("A signed-in user is required.".to_string()))
  }

  pub fn success(&self, message: &str) {
    self.notifier.notify(Severity::Success, message);
  }

  pub fn info(&self, message: &str) {
    self.notifier.notify(Severity::Info, message);
  }

  pub fn error(&self, message: &str) {
    self.notifier.notify(Severity::Error, message);
  }
}
