use anyhow::Result as AnyResult;
use async_fn_stream::try_fn_stream;
use futures::{future::BoxFuture, FutureExt, Stream};
use serde_json::Value;
use std::{
    collections::{HashMap, HashSet},
    fmt,
    future::Future,
    sync::Arc,
    time::Instant,
};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, INPUTS, OUTPUTS};

/// Named values flowing through a pipeline run.
pub type Values = HashMap<String, Value>;

type Invoke = dyn Fn(Values) -> BoxFuture<'static, AnyResult<Values>> + Send + Sync;

/// A named unit of work with declared input and output keys.
#[derive(Clone)]
pub struct Step {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    invoke: Arc<Invoke>,
}

impl Step {
    pub fn new<I, O, F, Fut>(name: impl Into<String>, inputs: I, outputs: O, invoke: F) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
        F: Fn(Values) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AnyResult<Values>> + Send + 'static,
    {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            invoke: Arc::new(move |values| invoke(values).boxed()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of steps sharing one execution context.
#[derive(Debug, Clone)]
pub struct Pipeline {
    inputs: Vec<String>,
    outputs: Vec<String>,
    steps: Vec<Step>,
}

#[derive(Debug, Default)]
pub struct PipelineBuilder {
    inputs: Vec<String>,
    outputs: Vec<String>,
    steps: Vec<Step>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn input(mut self, key: impl Into<String>) -> Self {
        self.inputs.push(key.into());
        self
    }

    #[must_use]
    pub fn inputs<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.inputs.extend(keys.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    #[must_use]
    pub fn output(mut self, key: impl Into<String>) -> Self {
        self.outputs.push(key.into());
        self
    }

    #[must_use]
    pub fn outputs<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.outputs.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Finalizes the pipeline.
    ///
    /// When no final outputs were declared, the outputs of the last step are used.
    ///
    /// # Errors
    ///
    /// Fails with [`PipelineError::DuplicateOutput`] if a step writes a key that an earlier step
    /// (or the declared inputs) already provides.
    pub fn build(mut self) -> Result<Pipeline, PipelineError> {
        let mut produced: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();

        for step in &self.steps {
            for key in &step.outputs {
                if !produced.insert(key) {
                    return Err(PipelineError::DuplicateOutput {
                        key: key.clone(),
                        step: step.name.clone(),
                    });
                }
            }
        }

        if self.outputs.is_empty() {
            self.outputs = self
                .steps
                .last()
                .map(|step| step.outputs.clone())
                .unwrap_or_default();
        }

        Ok(Pipeline {
            inputs: self.inputs,
            outputs: self.outputs,
            steps: self.steps,
        })
    }
}

/// Progress of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Validating,
    Running(usize),
    Completed,
    Failed,
}

/// Outputs of one finished step, as yielded by [`Pipeline::stream`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvent {
    pub index: usize,
    pub step: String,
    pub outputs: Values,
}

impl Pipeline {
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    #[must_use]
    pub fn required_inputs(&self) -> &[String] {
        &self.inputs
    }

    #[must_use]
    pub fn final_outputs(&self) -> &[String] {
        &self.outputs
    }

    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Keeps only the declared final outputs of an execution context.
    ///
    /// Lets callers that drive [`Pipeline::stream`] end up with what [`Pipeline::run`] returns.
    #[must_use]
    pub fn select_outputs(&self, mut context: Values) -> Values {
        self.outputs
            .iter()
            .filter_map(|key| context.remove_entry(key))
            .collect()
    }

    /// Checks that every key a step reads is supplied or produced by an earlier step.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::MissingInput`] naming the first unreachable key.
    /// - [`PipelineError::DuplicateOutput`] if a supplied input would be overwritten by a step.
    pub fn validate<'a>(&self, provided: impl IntoIterator<Item = &'a str>) -> Result<(), PipelineError> {
        let mut available: HashSet<&str> = provided.into_iter().collect();

        if let Some(key) = self.inputs.iter().find(|key| !available.contains(key.as_str())) {
            let step = self
                .steps
                .iter()
                .find(|step| step.inputs.contains(key))
                .map_or(INPUTS, |step| step.name.as_str());

            return Err(PipelineError::MissingInput {
                key: key.clone(),
                step: step.to_owned(),
            });
        }

        for step in &self.steps {
            if let Some(key) = step.inputs.iter().find(|key| !available.contains(key.as_str())) {
                return Err(PipelineError::MissingInput {
                    key: key.clone(),
                    step: step.name.clone(),
                });
            }

            for key in &step.outputs {
                if !available.insert(key) {
                    return Err(PipelineError::DuplicateOutput {
                        key: key.clone(),
                        step: step.name.clone(),
                    });
                }
            }
        }

        if let Some(key) = self.outputs.iter().find(|key| !available.contains(key.as_str())) {
            return Err(PipelineError::MissingInput {
                key: key.clone(),
                step: OUTPUTS.to_owned(),
            });
        }

        Ok(())
    }

    /// Runs every step in order and returns the declared final outputs.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by validation or by a step; no later step runs.
    pub async fn run(&self, inputs: Values) -> Result<Values, PipelineError> {
        let mut run = Run::new(self, inputs);
        run.validate()?;
        while run.advance().await?.is_some() {}

        Ok(run.finish())
    }

    /// Like [`Pipeline::run`], but hands back the whole execution context,
    /// intermediate values and initial inputs included.
    ///
    /// # Errors
    ///
    /// Same as [`Pipeline::run`].
    pub async fn run_with_context(&self, inputs: Values) -> Result<Values, PipelineError> {
        let mut run = Run::new(self, inputs);
        run.validate()?;
        while run.advance().await?.is_some() {}

        Ok(run.context)
    }

    /// Runs the pipeline, yielding the outputs of each step as soon as it finishes.
    pub fn stream(&self, inputs: Values) -> impl Stream<Item = Result<StepEvent, PipelineError>> + '_ {
        try_fn_stream(move |emitter| async move {
            let mut run = Run::new(self, inputs);
            run.validate()?;

            while let Some(event) = run.advance().await? {
                emitter.emit(event).await;
            }

            Ok(())
        })
    }
}

struct Run<'p> {
    pipeline: &'p Pipeline,
    context: Values,
    state: RunState,
    started_at: Instant,
}

impl<'p> Run<'p> {
    fn new(pipeline: &'p Pipeline, inputs: Values) -> Self {
        Self {
            pipeline,
            context: inputs,
            state: RunState::NotStarted,
            started_at: Instant::now(),
        }
    }

    fn transition(&mut self, state: RunState) {
        debug!(from = ?self.state, to = ?state, "pipeline state");
        self.state = state;
    }

    fn fail(&mut self, error: PipelineError) -> PipelineError {
        warn!(step = error.step(), "{error}");
        self.transition(RunState::Failed);
        error
    }

    fn validate(&mut self) -> Result<(), PipelineError> {
        self.transition(RunState::Validating);

        if let Err(error) = self.pipeline.validate(self.context.keys().map(String::as_str)) {
            return Err(self.fail(error));
        }

        self.transition(if self.pipeline.steps.is_empty() {
            RunState::Completed
        } else {
            RunState::Running(0)
        });

        Ok(())
    }

    async fn advance(&mut self) -> Result<Option<StepEvent>, PipelineError> {
        let RunState::Running(index) = self.state else {
            return Ok(None);
        };

        let pipeline = self.pipeline;
        let step = &pipeline.steps[index];
        let mut input = Values::with_capacity(step.inputs.len());
        for key in &step.inputs {
            let Some(value) = self.context.get(key) else {
                let error = PipelineError::MissingInput {
                    key: key.clone(),
                    step: step.name.clone(),
                };
                return Err(self.fail(error));
            };
            input.insert(key.clone(), value.clone());
        }

        debug!(step = %step.name, index, "running step");
        let started_at = Instant::now();

        let outputs = match (step.invoke)(input).await {
            Ok(outputs) => outputs,
            Err(source) => {
                let error = PipelineError::StepExecution {
                    step: step.name.clone(),
                    source,
                };
                return Err(self.fail(error));
            }
        };

        if let Err(error) = check_contract(step, &outputs) {
            return Err(self.fail(error));
        }

        debug!(
            step = %step.name,
            elapsed_ms = started_at.elapsed().as_millis(),
            "step finished"
        );

        let event = StepEvent {
            index,
            step: step.name.clone(),
            outputs: outputs.clone(),
        };
        self.context.extend(outputs);

        if index + 1 == pipeline.steps.len() {
            info!(
                steps = pipeline.steps.len(),
                elapsed_ms = self.started_at.elapsed().as_millis(),
                "pipeline completed"
            );
            self.transition(RunState::Completed);
        } else {
            self.transition(RunState::Running(index + 1));
        }

        Ok(Some(event))
    }

    fn finish(self) -> Values {
        self.pipeline.select_outputs(self.context)
    }
}

fn check_contract(step: &Step, outputs: &Values) -> Result<(), PipelineError> {
    let mut missing = step
        .outputs
        .iter()
        .filter(|key| !outputs.contains_key(*key))
        .cloned()
        .collect::<Vec<_>>();
    let mut unexpected = outputs
        .keys()
        .filter(|key| !step.outputs.contains(*key))
        .cloned()
        .collect::<Vec<_>>();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    missing.sort();
    unexpected.sort();

    Err(PipelineError::ContractViolation {
        step: step.name.clone(),
        missing,
        unexpected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use map_macro::map;
    use serde_json::json;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    fn text(values: &Values, key: &str) -> String {
        values[key].as_str().unwrap().to_owned()
    }

    fn claim_pipeline(log: &Arc<Mutex<Vec<String>>>) -> Pipeline {
        let (a, b, c) = (log.clone(), log.clone(), log.clone());

        Pipeline::builder()
            .input("review")
            .step(Step::new("summarize", ["review"], ["summary"], move |v| {
                a.lock().unwrap().push(format!("summarize({})", text(&v, "review")));
                async move { Ok(map! { "summary".to_owned() => json!("basement flooded") }) }
            }))
            .step(Step::new("classify", ["summary"], ["claim_type"], move |v| {
                b.lock().unwrap().push(format!("classify({})", text(&v, "summary")));
                async move { Ok(map! { "claim_type".to_owned() => json!("flood") }) }
            }))
            .step(Step::new(
                "respond",
                ["summary", "claim_type"],
                ["final_response"],
                move |v| {
                    c.lock().unwrap().push(format!(
                        "respond({}, {})",
                        text(&v, "summary"),
                        text(&v, "claim_type")
                    ));
                    async move { Ok(map! { "final_response".to_owned() => json!("We are on it.") }) }
                },
            ))
            .outputs(["summary", "claim_type", "final_response"])
            .build()
            .unwrap()
    }

    fn counting_step(
        name: &str,
        inputs: &[&str],
        outputs: &'static [&'static str],
        counter: &Arc<AtomicUsize>,
    ) -> Step {
        let counter = counter.clone();
        Step::new(name, inputs.to_vec(), outputs.to_vec(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok(outputs
                    .iter()
                    .map(|key| ((*key).to_owned(), json!(key)))
                    .collect())
            }
        })
    }

    #[tokio::test]
    async fn should_thread_outputs_through_steps_in_order() {
        // Given
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = claim_pipeline(&log);

        // When
        let outputs = pipeline
            .run(map! { "review".to_owned() => json!("flood in basement") })
            .await
            .unwrap();

        // Then
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "summarize(flood in basement)",
                "classify(basement flooded)",
                "respond(basement flooded, flood)",
            ]
        );

        let mut keys = outputs.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, vec!["claim_type", "final_response", "summary"]);
        assert_eq!(outputs["final_response"], json!("We are on it."));
    }

    #[tokio::test]
    async fn should_only_expose_declared_inputs_to_a_step() {
        // Given
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let pipeline = Pipeline::builder()
            .inputs(["review", "customer"])
            .step(Step::new("summarize", ["review"], ["summary"], move |v| {
                let mut keys = v.keys().cloned().collect::<Vec<_>>();
                keys.sort();
                sink.lock().unwrap().extend(keys);
                async move { Ok(map! { "summary".to_owned() => json!("short") }) }
            }))
            .build()
            .unwrap();

        // When
        pipeline
            .run(map! {
                "review".to_owned() => json!("long review"),
                "customer".to_owned() => json!("Jane")
            })
            .await
            .unwrap();

        // Then
        assert_eq!(*seen.lock().unwrap(), vec!["review"]);
    }

    #[tokio::test]
    async fn should_reject_unreachable_inputs_before_running() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .input("review")
            .step(counting_step("summarize", &["review"], &["summary"], &counter))
            .step(counting_step("respond", &["summary", "topics"], &["response"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("flood in basement") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::MissingInput { ref key, ref step } if key == "topics" && step == "respond"
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_reject_missing_initial_inputs() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .inputs(["product", "audience"])
            .step(counting_step("describe", &["product", "audience"], &["description"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "product".to_owned() => json!("smart water bottle") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::MissingInput { ref key, ref step } if key == "audience" && step == "describe"
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_attribute_unread_missing_inputs_to_the_boundary() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .inputs(["review", "locale"])
            .step(counting_step("summarize", &["review"], &["summary"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("flood in basement") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::MissingInput { ref key, ref step } if key == "locale" && step == INPUTS
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_reject_final_outputs_nobody_produces() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .input("review")
            .step(counting_step("summarize", &["review"], &["summary"], &counter))
            .outputs(["summary", "categories"])
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("meh") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::MissingInput { ref key, ref step } if key == "categories" && step == OUTPUTS
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_fail_on_extra_outputs_and_stop() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .input("review")
            .step(Step::new("summarize", ["review"], ["summary"], |_| async {
                Ok(map! {
                    "summary".to_owned() => json!("short"),
                    "mood".to_owned() => json!("angry")
                })
            }))
            .step(counting_step("respond", &["summary"], &["response"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("bad phone") })
            .await
            .unwrap_err();

        // Then
        match error {
            PipelineError::ContractViolation {
                step,
                missing,
                unexpected,
            } => {
                assert_eq!(step, "summarize");
                assert!(missing.is_empty());
                assert_eq!(unexpected, vec!["mood"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_fail_on_missing_outputs() {
        // Given
        let pipeline = Pipeline::builder()
            .input("review")
            .step(Step::new("extract", ["review"], ["summary", "key_points"], |_| async {
                Ok(map! { "summary".to_owned() => json!("short") })
            }))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("bad phone") })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::ContractViolation { ref missing, .. } if missing == &vec!["key_points".to_owned()]
        ));
    }

    #[tokio::test]
    async fn should_wrap_step_failures_and_halt() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .input("review")
            .step(Step::new("summarize", ["review"], ["summary"], |_| async {
                Err(anyhow::anyhow!("rate limited"))
            }))
            .step(counting_step("respond", &["summary"], &["response"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! { "review".to_owned() => json!("bad phone") })
            .await
            .unwrap_err();

        // Then
        assert_eq!(error.step(), "summarize");
        assert!(matches!(error, PipelineError::StepExecution { ref source, .. } if source.to_string() == "rate limited"));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn should_refuse_duplicate_outputs() {
        // When
        let counter = Arc::new(AtomicUsize::new(0));
        let error = Pipeline::builder()
            .input("review")
            .step(counting_step("first", &["review"], &["summary"], &counter))
            .step(counting_step("second", &["review"], &["summary"], &counter))
            .build()
            .unwrap_err();

        // Then
        assert!(matches!(
            error,
            PipelineError::DuplicateOutput { ref key, ref step } if key == "summary" && step == "second"
        ));
    }

    #[tokio::test]
    async fn should_refuse_to_overwrite_supplied_values() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .input("review")
            .step(counting_step("summarize", &["review"], &["summary"], &counter))
            .build()
            .unwrap();

        // When
        let error = pipeline
            .run(map! {
                "review".to_owned() => json!("bad phone"),
                "summary".to_owned() => json!("stale")
            })
            .await
            .unwrap_err();

        // Then
        assert!(matches!(error, PipelineError::DuplicateOutput { ref key, .. } if key == "summary"));
        assert_eq!(
            error.to_string(),
            "Output \"summary\" of step \"summarize\" would overwrite an existing value."
        );
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn should_be_deterministic_across_runs() {
        // Given
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = claim_pipeline(&log);
        let inputs = map! { "review".to_owned() => json!("flood in basement") };

        // When
        let first = pipeline.run(inputs.clone()).await.unwrap();
        let second = pipeline.run(inputs).await.unwrap();

        // Then
        assert_eq!(first, second);
        assert_eq!(log.lock().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn should_default_to_last_step_outputs() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .inputs(["product", "audience"])
            .step(counting_step("describe", &["product", "audience"], &["description"], &counter))
            .step(counting_step("tagline", &["description"], &["tagline"], &counter))
            .build()
            .unwrap();

        // When
        let outputs = pipeline
            .run(map! {
                "product".to_owned() => json!("smart water bottle"),
                "audience".to_owned() => json!("fitness enthusiasts")
            })
            .await
            .unwrap();

        // Then
        assert_eq!(pipeline.final_outputs(), ["tagline"]);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["tagline"], json!("tagline"));
    }

    #[tokio::test]
    async fn should_keep_intermediates_in_context() {
        // Given
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = claim_pipeline(&log);

        // When
        let context = pipeline
            .run_with_context(map! { "review".to_owned() => json!("flood in basement") })
            .await
            .unwrap();

        // Then
        assert_eq!(context.len(), 4);
        assert_eq!(context["review"], json!("flood in basement"));
    }

    #[tokio::test]
    async fn should_stream_step_events() {
        // Given
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = claim_pipeline(&log);

        // When
        let events = pipeline
            .stream(map! { "review".to_owned() => json!("flood in basement") })
            .collect::<Vec<_>>()
            .await;

        // Then
        let steps = events
            .into_iter()
            .map(|event| event.unwrap().step)
            .collect::<Vec<_>>();
        assert_eq!(steps, vec!["summarize", "classify", "respond"]);
    }

    #[tokio::test]
    async fn should_select_the_same_outputs_from_a_streamed_run() {
        // Given
        let log = Arc::new(Mutex::new(Vec::new()));
        let pipeline = claim_pipeline(&log);
        let inputs: Values = map! { "review".to_owned() => json!("flood in basement") };

        // When
        let mut context = inputs.clone();
        let mut events = Box::pin(pipeline.stream(inputs.clone()));
        while let Some(event) = events.next().await {
            context.extend(event.unwrap().outputs);
        }
        drop(events);
        let streamed = pipeline.select_outputs(context);

        // Then
        assert_eq!(streamed, pipeline.run(inputs).await.unwrap());
        assert!(!streamed.contains_key("review"));
    }

    #[tokio::test]
    async fn should_end_stream_with_validation_error() {
        // Given
        let counter = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::builder()
            .step(counting_step("respond", &["topics"], &["response"], &counter))
            .build()
            .unwrap();

        // When
        let events = pipeline.stream(Values::new()).collect::<Vec<_>>().await;

        // Then
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(PipelineError::MissingInput { ref key, .. }) if key == "topics"));
    }
}
