// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent state machine (spec §4.4): a three-node graph (`START`,
//! `MODEL`, `TOOL`) that drives a [`Run`] to `done`/`paused`/`failed`.
//!
//! The engine is pull-based, not a spawned task: callers drive it forward
//! by calling [`Engine::create_run`], [`Engine::append_message`], or
//! [`Engine::notify_job_result`] whenever something happens that could
//! unstick the run (a run is created, a human/supervisor message arrives,
//! or a dispatched tool job resolves). This mirrors the teacher's
//! request-driven `RuntimeRouter` rather than a background poll loop —
//! see `crates/daemon/src/adapters/agent/router.rs`.

use crate::context::{check_system_prompt, trim_messages};
use crate::error::AgentError;
use crate::model::{Model, ModelRequest};
use crate::prompt::build_system_prompt;
use crate::relevance::{AllToolsResolver, RelevantToolsResolver};
use crate::tokens::{ApproximateTokenCounter, TokenCounter};
use acp_core::{
    AgentMessageBody, ClusterId, IdGen, Invocation, InvocationId, InvocationResultBody, JobConfig,
    JobId, Message, MessageId, MessageKind, ResultType, Run, RunId, SchemaIr, ToolName,
};
use acp_queue::Queue;
use acp_registry::Registry;
use acp_store::{Op, Store};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Cycle guard thresholds (spec §4.4 step 1, §8 property 7).
const CYCLE_GUARD_TOTAL_MESSAGES: usize = 100;
const CYCLE_GUARD_TAIL_WINDOW: usize = 10;

enum Node {
    End,
    Tool,
    Model,
}

/// The model's raw `invocations[]` entry shape: no `id`, since ids are
/// minted by the engine (spec §4.4 step 8 assigns identity after the fact).
#[derive(Debug, Clone, Deserialize)]
struct RawInvocation {
    #[serde(rename = "toolName")]
    tool_name: String,
    input: Value,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawAgentData {
    #[serde(default)]
    done: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    invocations: Vec<RawInvocation>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    issue: Option<String>,
}

pub struct Engine {
    store: Store,
    registry: Registry,
    queue: Arc<Queue>,
    model: Arc<dyn Model>,
    tools_resolver: Arc<dyn RelevantToolsResolver>,
    token_counter: Arc<dyn TokenCounter>,
    model_context_window: usize,
}

impl Engine {
    pub fn new(store: Store, queue: Arc<Queue>, model: Arc<dyn Model>, model_context_window: usize) -> Self {
        let registry = Registry::new(store.clone());
        Self {
            store,
            registry,
            queue,
            model,
            tools_resolver: Arc::new(AllToolsResolver),
            token_counter: Arc::new(ApproximateTokenCounter),
            model_context_window,
        }
    }

    pub fn with_tools_resolver(mut self, resolver: Arc<dyn RelevantToolsResolver>) -> Self {
        self.tools_resolver = resolver;
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.token_counter = counter;
        self
    }

    /// Create a run, optionally seed its transcript with `initial_prompt`
    /// as a `human` message, then drive it forward one edge-chain.
    pub async fn create_run(
        &self,
        id: RunId,
        config: acp_core::RunConfig,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<Run, AgentError> {
        if let Some(existing) = self.store.with_state(|s| s.get_run(&config.cluster_id, &id).cloned()) {
            return Ok(existing);
        }

        let cluster_id = config.cluster_id.clone();
        let initial_prompt = config.initial_prompt.clone();
        let run = Run::new(id.clone(), config, now_ms);
        self.store.apply(Op::RunCreated(Box::new(run)))?;
        self.store.apply(Op::RunStarted { cluster_id: cluster_id.clone(), run_id: id.clone() })?;

        if let Some(content) = initial_prompt {
            let message = Message::new(
                MessageId::generate(now_ms, id_gen),
                id.clone(),
                now_ms,
                MessageKind::Human { content },
            );
            self.store.apply(Op::MessageAppended(Box::new(message)))?;
        }

        self.step(&cluster_id, &id, now_ms, id_gen).await
    }

    /// Append a `human` or `supervisor` message and drive the run forward
    /// (spec §6 `POST .../messages`; resumes a `paused` run).
    pub async fn append_message(
        &self,
        cluster_id: ClusterId,
        run_id: RunId,
        content: String,
        supervisor: bool,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<Run, AgentError> {
        let run = self
            .store
            .with_state(|s| s.get_run(&cluster_id, &run_id).cloned())
            .ok_or_else(|| AgentError::RunNotFound(run_id.as_str().to_string()))?;

        if run.status == acp_core::RunStatus::Paused {
            self.store.apply(Op::RunResumed { cluster_id: cluster_id.clone(), run_id: run_id.clone() })?;
        }

        let kind = if supervisor {
            MessageKind::Supervisor { content }
        } else {
            MessageKind::Human { content }
        };
        let message = Message::new(MessageId::generate(now_ms, id_gen), run_id.clone(), now_ms, kind);
        self.store.apply(Op::MessageAppended(Box::new(message)))?;

        self.step(&cluster_id, &run_id, now_ms, id_gen).await
    }

    /// Called after a tool job tied to this run resolves (rejects,
    /// resolves, or is interrupted) to resume the run loop.
    pub async fn notify_job_result(
        &self,
        cluster_id: ClusterId,
        run_id: RunId,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<Run, AgentError> {
        let run = self
            .store
            .with_state(|s| s.get_run(&cluster_id, &run_id).cloned())
            .ok_or_else(|| AgentError::RunNotFound(run_id.as_str().to_string()))?;
        if run.status == acp_core::RunStatus::Paused {
            self.store.apply(Op::RunResumed { cluster_id: cluster_id.clone(), run_id: run_id.clone() })?;
        }
        self.step(&cluster_id, &run_id, now_ms, id_gen).await
    }

    async fn step(
        &self,
        cluster_id: &ClusterId,
        run_id: &RunId,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<Run, AgentError> {
        loop {
            let run = self
                .store
                .with_state(|s| s.get_run(cluster_id, run_id).cloned())
                .ok_or_else(|| AgentError::RunNotFound(run_id.as_str().to_string()))?;
            if run.status.is_terminal() || run.status == acp_core::RunStatus::Paused {
                return Ok(run);
            }

            let messages = self.store.with_state(|s| s.messages_for_run(run_id).to_vec());
            let has_pending_jobs = self.store.with_state(|s| {
                s.jobs.values().any(|j| j.run_id.as_ref() == Some(run_id) && !j.status.is_terminal())
            });

            if should_pause(&run, &messages, has_pending_jobs) {
                self.store.apply(Op::RunPaused { cluster_id: cluster_id.clone(), run_id: run_id.clone() })?;
                continue;
            }

            match decide_node(&messages, has_pending_jobs) {
                Node::End => return Ok(run),
                Node::Tool => {
                    let enqueued_real_job =
                        self.run_tool_node(cluster_id, run_id, &messages, now_ms, id_gen).await?;
                    if enqueued_real_job {
                        return self
                            .store
                            .with_state(|s| s.get_run(cluster_id, run_id).cloned())
                            .ok_or_else(|| {
                                AgentError::RunNotFound(run_id.as_str().to_string())
                            });
                    }
                }
                Node::Model => {
                    self.run_model_node(cluster_id, run_id, &run, &messages, now_ms, id_gen).await?;
                }
            }
        }
    }

    /// `TOOL` node (spec §4.4): dispatch every invocation without a result.
    /// Returns `true` if at least one real job was enqueued (the run must
    /// now wait); `false` if every invocation was synthesized inline (e.g.
    /// unknown tool), in which case the caller should re-evaluate
    /// immediately rather than wait on an event that will never arrive.
    async fn run_tool_node(
        &self,
        cluster_id: &ClusterId,
        run_id: &RunId,
        messages: &[Message],
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<bool, AgentError> {
        let unresolved = unresolved_invocations(messages);
        let mut enqueued_real_job = false;

        for inv in unresolved {
            let tool_name = ToolName::new(inv.tool_name.clone());
            let tool = self.store.with_state(|s| s.get_tool(cluster_id, &tool_name).cloned());
            let callable = tool.as_ref().is_some_and(|t| t.is_live(now_ms));

            if !callable {
                let result = serde_json::json!({
                    "error": format!("tool '{}' is unknown or not currently callable", inv.tool_name)
                });
                let message = Message::new(
                    MessageId::generate(now_ms, id_gen),
                    run_id.clone(),
                    now_ms,
                    MessageKind::InvocationResult(InvocationResultBody {
                        invocation_id: inv.id.clone(),
                        tool_name: inv.tool_name.clone(),
                        result_type: ResultType::Rejection,
                        result,
                    }),
                );
                self.store.apply(Op::MessageAppended(Box::new(message)))?;
                continue;
            }

            let tool_config = tool.expect("callable implies tool exists").config;
            let job_id = JobId::new(inv.id.as_str());
            let config = JobConfig {
                cluster_id: cluster_id.clone(),
                run_id: Some(run_id.clone()),
                workflow_execution_id: None,
                target_fn: inv.tool_name.clone(),
                target_args: inv.input.clone(),
                tool_config,
                cache_key: None,
                auth_context: None,
                run_context: None,
            };
            self.queue.create_job(job_id, config, now_ms)?;
            enqueued_real_job = true;
        }

        Ok(enqueued_real_job)
    }

    /// `MODEL` node (spec §4.4 steps 1-8).
    async fn run_model_node(
        &self,
        cluster_id: &ClusterId,
        run_id: &RunId,
        run: &Run,
        messages: &[Message],
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<(), AgentError> {
        if cycle_guard_tripped(messages) {
            self.store.apply(Op::RunFailed {
                cluster_id: cluster_id.clone(),
                run_id: run_id.clone(),
                reason: AgentError::Cycle.to_string(),
            })?;
            return Ok(());
        }

        let callable = self.registry.callable_tools(cluster_id, None, now_ms);
        let relevant = self.tools_resolver.resolve(messages, &callable);

        let system = build_system_prompt(
            run.additional_context.as_ref(),
            &relevant,
            &callable,
            run.enable_result_grounding,
        );
        let system_tokens =
            check_system_prompt(&system, self.model_context_window, self.token_counter.as_ref())?;
        let trimmed =
            trim_messages(messages, system_tokens, self.model_context_window, self.token_counter.as_ref());

        let tool_schemas: Vec<(String, SchemaIr)> = relevant
            .iter()
            .map(|t| {
                (
                    t.name.as_str().to_string(),
                    t.schema.clone().unwrap_or_else(|| SchemaIr::new(serde_json::json!({"type": "object"}))),
                )
            })
            .collect();
        let schema = SchemaIr::build_agent_response_schema(run.result_schema.as_ref(), &tool_schemas);

        let response = self
            .model
            .structured(ModelRequest { messages: trimmed, system, schema: schema.clone() })
            .await
            .map_err(|e| AgentError::ProviderFailure(e.to_string()))?;

        if let Err(e) = schema.validate(&response.data) {
            self.append_invalid_and_supervisor(
                run_id,
                response.data.clone(),
                e.to_string(),
                "Provided object was invalid, check your input",
                now_ms,
                id_gen,
            )?;
            return Ok(());
        }

        let mut raw: RawAgentData = match serde_json::from_value(response.data.clone()) {
            Ok(raw) => raw,
            Err(e) => {
                self.append_invalid_and_supervisor(
                    run_id,
                    response.data.clone(),
                    e.to_string(),
                    "Provided object was invalid, check your input",
                    now_ms,
                    id_gen,
                )?;
                return Ok(());
            }
        };

        for call in response.raw_tool_calls {
            raw.invocations.push(RawInvocation {
                tool_name: call.tool_name,
                input: call.input,
                reasoning: Some("Extracted from tool calls".to_string()),
            });
        }

        let invocations_nonempty = !raw.invocations.is_empty();
        let mut done = raw.done;
        let mut result = raw.result.clone();
        let mut message = raw.message.clone();

        if done && invocations_nonempty {
            done = false;
            result = None;
            message = None;
        } else if !done && !invocations_nonempty {
            self.append_invalid_and_supervisor(
                run_id,
                serde_json::to_value(&raw).unwrap_or(Value::Null),
                "response carried neither invocations nor a completion signal".to_string(),
                "If you cannot complete a task, invoke a tool or set done to true with a result or message.",
                now_ms,
                id_gen,
            )?;
        } else if done && result.is_none() && message.is_none() {
            done = false;
            self.append_invalid_and_supervisor(
                run_id,
                serde_json::to_value(&raw).unwrap_or(Value::Null),
                "done was set without a result or message".to_string(),
                "Please provide a final result or a reason for stopping",
                now_ms,
                id_gen,
            )?;
        }

        let invocations: Vec<Invocation> = raw
            .invocations
            .into_iter()
            .map(|ri| Invocation {
                id: InvocationId::new(id_gen.next()),
                tool_name: ri.tool_name,
                input: ri.input,
                reasoning: ri.reasoning,
            })
            .collect();

        let body = AgentMessageBody {
            done,
            message,
            invocations,
            result: result.clone(),
            issue: raw.issue,
            extra: Default::default(),
        };
        let agent_message =
            Message::new(MessageId::generate(now_ms, id_gen), run_id.clone(), now_ms, MessageKind::Agent(body));
        self.store.apply(Op::MessageAppended(Box::new(agent_message)))?;

        if done {
            self.store.apply(Op::RunFinished {
                cluster_id: cluster_id.clone(),
                run_id: run_id.clone(),
                result: result.unwrap_or(Value::Null),
            })?;
        }

        Ok(())
    }

    fn append_invalid_and_supervisor(
        &self,
        run_id: &RunId,
        raw: Value,
        validation_error: String,
        supervisor_prompt: &str,
        now_ms: u64,
        id_gen: &impl IdGen,
    ) -> Result<(), AgentError> {
        let invalid = Message::new(
            MessageId::generate(now_ms, id_gen),
            run_id.clone(),
            now_ms,
            MessageKind::AgentInvalid { raw, validation_error },
        );
        self.store.apply(Op::MessageAppended(Box::new(invalid)))?;

        let supervisor = Message::new(
            MessageId::generate(now_ms, id_gen),
            run_id.clone(),
            now_ms,
            MessageKind::Supervisor { content: supervisor_prompt.to_string() },
        );
        self.store.apply(Op::MessageAppended(Box::new(supervisor)))?;
        Ok(())
    }
}

fn decide_node(messages: &[Message], has_pending_jobs: bool) -> Node {
    if has_pending_jobs {
        return Node::End;
    }
    if let Some(Message { kind: MessageKind::Agent(body), .. }) = messages.last() {
        if !body.invocations.is_empty() {
            return Node::Tool;
        }
    }
    if !unresolved_invocations(messages).is_empty() {
        return Node::Tool;
    }
    Node::Model
}

fn should_pause(run: &Run, messages: &[Message], has_pending_jobs: bool) -> bool {
    if !run.interactive || has_pending_jobs {
        return false;
    }
    matches!(
        messages.last(),
        Some(Message { kind: MessageKind::Agent(body), .. }) if !body.done && body.invocations.is_empty()
    )
}

fn cycle_guard_tripped(messages: &[Message]) -> bool {
    if messages.len() >= CYCLE_GUARD_TOTAL_MESSAGES {
        return true;
    }
    if messages.len() >= CYCLE_GUARD_TAIL_WINDOW {
        let tail = &messages[messages.len() - CYCLE_GUARD_TAIL_WINDOW..];
        if !tail.iter().any(Message::is_human_or_invocation_result) {
            return true;
        }
    }
    false
}

/// Every invocation emitted across the transcript that has no matching
/// `invocation-result` message yet, in emission order.
fn unresolved_invocations(messages: &[Message]) -> Vec<Invocation> {
    let mut resolved: HashSet<InvocationId> = HashSet::new();
    let mut invoked: Vec<Invocation> = Vec::new();
    for message in messages {
        match &message.kind {
            MessageKind::Agent(body) => invoked.extend(body.invocations.iter().cloned()),
            MessageKind::InvocationResult(body) => {
                resolved.insert(body.invocation_id.clone());
            }
            _ => {}
        }
    }
    invoked.into_iter().filter(|inv| !resolved.contains(&inv.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::FakeModel;
    use acp_core::test_support::SequentialIdGen;
    use acp_core::{MachineId, RunConfig, RunStatus, RunType};
    use acp_registry::{MachineHeartbeat, ToolDeclaration};

    fn new_engine(responses: Vec<Result<ModelResponse, crate::model::ModelError>>) -> (Engine, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let queue = Arc::new(Queue::new(store.clone()));
        let model = Arc::new(FakeModel::new(responses));
        (Engine::new(store, queue, model, 10_000), dir)
    }

    fn run_config(interactive: bool) -> RunConfig {
        RunConfig {
            cluster_id: ClusterId::new("cls"),
            run_type: RunType::MultiStep,
            initial_prompt: Some("hello".to_string()),
            result_schema: None,
            on_status_change: None,
            auth_context: None,
            additional_context: None,
            interactive,
            enable_result_grounding: false,
            tags: Default::default(),
            workflow_execution_id: None,
        }
    }

    fn declare_tool(engine: &Engine, name: &str) {
        engine
            .registry
            .heartbeat(
                ClusterId::new("cls"),
                MachineId::new("mch_1"),
                MachineHeartbeat::default(),
                &[ToolDeclaration {
                    name: ToolName::new(name),
                    description: None,
                    schema: None,
                    config: Default::default(),
                }],
                0,
            )
            .unwrap();
    }

    fn done_response(result: Value) -> ModelResponse {
        ModelResponse {
            data: serde_json::json!({"done": true, "result": result}),
            raw_tool_calls: vec![],
        }
    }

    #[tokio::test]
    async fn create_run_with_initial_prompt_drives_to_done() {
        let (engine, _dir) = new_engine(vec![Ok(done_response(serde_json::json!({"ok": true})))]);
        let id_gen = SequentialIdGen::new("id_");

        let run = engine
            .create_run(RunId::new("run_1"), run_config(false), 0, &id_gen)
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Done);
        assert_eq!(run.result, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn tool_invocation_dispatches_job_and_resumes_on_result() {
        let invoke_response = ModelResponse {
            data: serde_json::json!({
                "done": false,
                "invocations": [{"toolName": "echo", "input": {"text": "hi"}}]
            }),
            raw_tool_calls: vec![],
        };
        let (engine, _dir) =
            new_engine(vec![Ok(invoke_response), Ok(done_response(serde_json::json!({"said": "hi"})))]);
        declare_tool(&engine, "echo");
        let id_gen = SequentialIdGen::new("id_");
        let cluster_id = ClusterId::new("cls");
        let run_id = RunId::new("run_1");

        let run = engine.create_run(run_id.clone(), run_config(false), 0, &id_gen).await.unwrap();
        assert_eq!(run.status, RunStatus::Running);

        let job_id = engine
            .store
            .with_state(|s| s.jobs.values().find(|j| j.run_id.as_ref() == Some(&run_id)).unwrap().id.clone());

        let queue = Queue::new(engine.store.clone());
        let claimed = queue
            .list_jobs(
                acp_queue::ListJobsRequest {
                    cluster_id: cluster_id.clone(),
                    machine_id: MachineId::new("mch_1"),
                    heartbeat: MachineHeartbeat::default(),
                    tools: vec![ToolName::new("echo")],
                    limit: 10,
                    wait_time_seconds: 0,
                    acknowledge: true,
                },
                || 0,
            )
            .await
            .unwrap();
        assert_eq!(claimed.len(), 1);

        queue
            .create_job_result(
                cluster_id.clone(),
                job_id,
                "mch_1",
                ResultType::Resolution,
                serde_json::json!({"text": "hi"}),
                0,
                &id_gen,
            )
            .unwrap();

        let run = engine.notify_job_result(cluster_id, run_id, 0, &id_gen).await.unwrap();
        assert_eq!(run.status, RunStatus::Done);
        assert_eq!(run.result, Some(serde_json::json!({"said": "hi"})));
    }

    #[tokio::test]
    async fn unknown_tool_is_synthesized_as_rejection_without_blocking() {
        let invoke_response = ModelResponse {
            data: serde_json::json!({
                "done": false,
                "invocations": [{"toolName": "mystery", "input": {}}]
            }),
            raw_tool_calls: vec![],
        };
        let (engine, _dir) =
            new_engine(vec![Ok(invoke_response), Ok(done_response(serde_json::json!({"ok": true})))]);
        let id_gen = SequentialIdGen::new("id_");

        let run = engine
            .create_run(RunId::new("run_1"), run_config(false), 0, &id_gen)
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Done);
    }

    #[tokio::test]
    async fn cycle_guard_fails_run_after_repeated_empty_turns() {
        let stuck = ModelResponse { data: serde_json::json!({"done": false}), raw_tool_calls: vec![] };
        let responses: Vec<_> = (0..10).map(|_| Ok(stuck.clone())).collect();
        let (engine, _dir) = new_engine(responses);
        let id_gen = SequentialIdGen::new("id_");

        let run = engine
            .create_run(RunId::new("run_1"), run_config(false), 0, &id_gen)
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.failure_reason.unwrap().contains("cycle"));
    }

    #[tokio::test]
    async fn interactive_run_pauses_on_open_question_and_resumes_on_human_message() {
        let question = ModelResponse {
            data: serde_json::json!({"done": false, "message": "which environment?"}),
            raw_tool_calls: vec![],
        };
        let (engine, _dir) =
            new_engine(vec![Ok(question), Ok(done_response(serde_json::json!({"env": "prod"})))]);
        let id_gen = SequentialIdGen::new("id_");
        let cluster_id = ClusterId::new("cls");
        let run_id = RunId::new("run_1");

        let run = engine.create_run(run_id.clone(), run_config(true), 0, &id_gen).await.unwrap();
        assert_eq!(run.status, RunStatus::Paused);

        let run = engine
            .append_message(cluster_id, run_id, "prod".to_string(), false, 1, &id_gen)
            .await
            .unwrap();
        assert_eq!(run.status, RunStatus::Done);
    }
}
