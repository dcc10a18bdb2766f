// app/src/web/caller.rs

use actix_web::http::StatusCode;
use actix_web::{FromRequest, HttpRequest, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::notify::NoticeBuffer;
use crate::session::RequestContext;

pub const USER_HEADER: &str = "X-User-ID";

/// Who is calling, plus a buffer collecting the notices raised while serving the request.
///
/// Identity comes from the `X-User-ID` header; no header means an anonymous caller.
pub struct Caller {
  pub rctx: RequestContext,
  notices: Arc<NoticeBuffer>,
}

impl Caller {
  pub fn new(user_id: Option<Uuid>) -> Self {
    let notices = Arc::new(NoticeBuffer::new());
    let rctx = match user_id {
      Some(user_id) => RequestContext::signed_in(user_id, notices.clone()),
      None => RequestContext::anonymous(notices.clone()),
    };
    Self { rctx, notices }
  }

  /// Wraps `result` as `{ "data": ... }` or `{ "error": ... }`, adding the collected notices.
  pub fn respond<T: Serialize>(&self, status: StatusCode, result: AppResult<T>) -> HttpResponse {
    let notices = self.notices.take();
    match result {
      Ok(data) => HttpResponse::build(status).json(json!({ "data": data, "notices": notices })),
      Err(e) => {
        warn!(error = %e, "Request failed.");
        HttpResponse::build(e.status_code()).json(json!({ "error": e.public_message(), "notices": notices }))
      }
    }
  }

  pub fn ok<T: Serialize>(&self, result: AppResult<T>) -> HttpResponse {
    self.respond(StatusCode::OK, result)
  }
}

impl FromRequest for Caller {
  type Error = AppError;
  type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    let Some(header) = req.headers().get(USER_HEADER) else {
      return futures_util::future::ready(Ok(Caller::new(None)));
    };
    let parsed = header.to_str().ok().and_then(|raw| Uuid::parse_str(raw.trim()).ok());
    futures_util::future::ready(match parsed {
      Some(user_id) => Ok(Caller::new(Some(user_id))),
      None => {
        warn!("Caller extractor: malformed {} header.", USER_HEADER);
        Err(AppError::Unauthenticated(format!("Malformed {} header.", USER_HEADER)))
      }
    })
  }
}
