// core/src/pipeline/execution.rs

//! `Pipeline::run()`: step execution and compensation unwinding.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx_data`.
  ///
  /// On a handler error, compensators of the steps that already completed run
  /// in reverse order, then the original error is returned.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(
            context_data_type = %std::any::type_name::<TData>(),
            num_steps = self.steps.len(),
        ),
        err(Display)
    )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut completed: Vec<&str> = Vec::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond_fn) = &step_def.skip_if {
        if skip_cond_fn(ctx_data.clone()) {
          event!(parent: &step_span, Level::DEBUG, "Step skipped by its condition.");
          continue;
        }
      }

      let has_handlers = [&self.before, &self.on, &self.after]
        .iter()
        .any(|phase| phase.get(step_name).is_some_and(|v| !v.is_empty()));

      if !has_handlers {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Non-optional step has no handlers.");
        let err = Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        });
        self.compensate(&completed, &ctx_data).await;
        return Err(err);
      }

      let outcome = async {
        for (phase, handlers) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
          if let Some(handlers) = handlers.get(step_name) {
            if run_phase(phase, handlers, &ctx_data).await? == PipelineControl::Stop {
              return Ok(PipelineControl::Stop);
            }
          }
        }
        Ok::<_, Err>(PipelineControl::Continue)
      }
      .instrument(step_span.clone())
      .await;

      match outcome {
        Ok(PipelineControl::Continue) => {
          completed.push(step_name);
          event!(parent: &step_span, Level::DEBUG, "Step finished.");
        }
        Ok(PipelineControl::Stop) => {
          event!(parent: &step_span, Level::INFO, "Pipeline stopped by a handler.");
          return Ok(PipelineResult::Stopped);
        }
        Err(e) => {
          event!(parent: &step_span, Level::ERROR, error = %e, "Step failed.");
          self.compensate(&completed, &ctx_data).await;
          return Err(e);
        }
      }
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  /// Runs compensators for `completed` steps, newest first. Returns how many failed.
  async fn compensate(&self, completed: &[&str], ctx_data: &ContextData<TData>) -> usize {
    let mut failures = 0;
    for step_name in completed.iter().rev() {
      let Some(compensator) = self.compensations.get(*step_name) else {
        continue;
      };
      event!(Level::WARN, %step_name, "Compensating completed step.");
      if let Err(e) = compensator(ctx_data.clone()).await {
        failures += 1;
        event!(Level::ERROR, %step_name, error = %e, "Compensation failed; state may be inconsistent.");
      }
    }
    failures
  }
}

async fn run_phase<TData, Err>(
  phase: &'static str,
  handlers: &[Handler<TData, Err>],
  ctx_data: &ContextData<TData>,
) -> Result<PipelineControl, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler_fn) in handlers.iter().enumerate() {
    let control = handler_fn(ctx_data.clone())
      .instrument(span!(Level::DEBUG, "handler", phase, handler_index = handler_idx))
      .await
      .map_err(|e| {
        event!(Level::ERROR, phase, error = %e, "Handler failed.");
        e
      })?;
    if control == PipelineControl::Stop {
      return Ok(PipelineControl::Stop);
    }
  }
  Ok(PipelineControl::Continue)
}
