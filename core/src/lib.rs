// src/lib.rs

//! Wanderkart Flow: asynchronous step pipelines for multi-step business transactions.
//!
//! A pipeline is an ordered list of named steps. Each step may carry:
//!  - `before` / `on` / `after` handlers run against a shared, lockable context.
//!  - A `skip_if` condition evaluated against that context.
//!  - A compensating action, run in reverse order when a later step fails.
//!
//! Handlers return `PipelineControl::Stop` to halt gracefully. A handler error
//! aborts the run, unwinds the compensations of every completed step, and is
//! returned to the caller unchanged.
//!
//! `FlowRegistry` keeps one pipeline per context type so that services can
//! dispatch by building a context and calling `registry.run(ctx)`.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{Compensator, Handler};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
