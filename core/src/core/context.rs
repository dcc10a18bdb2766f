// core/src/core/context.rs

//! Boxed handler types stored by a pipeline.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A step handler.
///
/// Takes a clone of the shared `ContextData<TData>` and resolves to
/// `Result<PipelineControl, Err>`. Handlers must drop every lock guard before
/// their first `.await`.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// A compensating action that undoes the effect of a completed step.
///
/// Compensators run only after a later step failed, in reverse completion
/// order. Their errors are logged and do not stop the remaining compensators.
pub type Compensator<TData, Err> =
  Box<dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<(), Err>> + Send>> + Send + Sync>;
