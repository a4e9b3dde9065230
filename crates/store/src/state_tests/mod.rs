use super::*;
use acp_core::{
    Cluster, ClusterId, InterruptType, Job, JobConfig, JobId, ResultType, Run, RunConfig, RunId,
    RunType, ToolConfig,
};
use serde_json::json;

fn new_job(cluster_id: &str, job_id: &str) -> Job {
    Job::new(
        JobId::new(job_id),
        JobConfig {
            cluster_id: ClusterId::new(cluster_id),
            run_id: None,
            workflow_execution_id: None,
            target_fn: "echo".into(),
            target_args: json!({}),
            tool_config: ToolConfig::default(),
            cache_key: None,
            auth_context: None,
            run_context: None,
        },
        0,
    )
}

#[test]
fn job_created_is_idempotent() {
    let mut state = MaterializedState::default();
    let job = new_job("cls", "job_1");
    state.apply(&Op::JobCreated(Box::new(job.clone())));
    state.apply(&Op::JobCreated(Box::new(job.clone())));

    assert_eq!(state.jobs.len(), 1);
    assert_eq!(state.events.iter().filter(|e| e.job_id.is_some()).count(), 1);
}

#[test]
fn job_claim_resolve_transitions_and_emits_events() {
    let mut state = MaterializedState::default();
    let cluster_id = ClusterId::new("cls");
    let job_id = JobId::new("job_1");
    state.apply(&Op::JobCreated(Box::new(new_job("cls", "job_1"))));
    state.apply(&Op::JobClaimed {
        cluster_id: cluster_id.clone(),
        job_id: job_id.clone(),
        machine_id: acp_core::MachineId::new("mch_1"),
        now_ms: 1_000,
    });

    let job = state.get_job(&cluster_id, &job_id).unwrap();
    assert_eq!(job.status, acp_core::JobStatus::Running);

    state.apply(&Op::JobResolved {
        cluster_id: cluster_id.clone(),
        job_id: job_id.clone(),
        result_type: ResultType::Resolution,
        result: json!({"ok": true}),
    });
    let job = state.get_job(&cluster_id, &job_id).unwrap();
    assert_eq!(job.status, acp_core::JobStatus::Success);

    // A later resolve on an already-terminal job is a no-op (idempotency).
    state.apply(&Op::JobResolved {
        cluster_id,
        job_id,
        result_type: ResultType::Rejection,
        result: json!({}),
    });
    assert_eq!(state.jobs.values().next().unwrap().status, acp_core::JobStatus::Success);
}

#[test]
fn job_interrupt_and_approval_cycle() {
    let mut state = MaterializedState::default();
    let cluster_id = ClusterId::new("cls");
    let job_id = JobId::new("job_1");
    state.apply(&Op::JobCreated(Box::new(new_job("cls", "job_1"))));
    state.apply(&Op::JobClaimed {
        cluster_id: cluster_id.clone(),
        job_id: job_id.clone(),
        machine_id: acp_core::MachineId::new("mch_1"),
        now_ms: 0,
    });
    state.apply(&Op::JobInterrupted {
        cluster_id: cluster_id.clone(),
        job_id: job_id.clone(),
        interrupt_type: InterruptType::Approval,
        result: json!({}),
    });
    assert_eq!(
        state.get_job(&cluster_id, &job_id).unwrap().status,
        acp_core::JobStatus::Interrupted
    );

    state.apply(&Op::JobApproved { cluster_id: cluster_id.clone(), job_id: job_id.clone() });
    assert_eq!(state.get_job(&cluster_id, &job_id).unwrap().status, acp_core::JobStatus::Pending);
}

#[test]
fn run_lifecycle_through_ops() {
    let mut state = MaterializedState::default();
    let cluster_id = ClusterId::new("cls");
    let run_id = RunId::new("run_1");
    let run = Run::new(
        run_id.clone(),
        RunConfig {
            cluster_id: cluster_id.clone(),
            run_type: RunType::MultiStep,
            initial_prompt: None,
            result_schema: None,
            on_status_change: None,
            auth_context: None,
            additional_context: None,
            interactive: false,
            enable_result_grounding: false,
            tags: Default::default(),
            workflow_execution_id: None,
        },
        0,
    );
    state.apply(&Op::RunCreated(Box::new(run)));
    state.apply(&Op::RunStarted { cluster_id: cluster_id.clone(), run_id: run_id.clone() });
    assert_eq!(
        state.get_run(&cluster_id, &run_id).unwrap().status,
        acp_core::RunStatus::Running
    );

    state.apply(&Op::RunFinished {
        cluster_id: cluster_id.clone(),
        run_id: run_id.clone(),
        result: json!({"done": true}),
    });
    assert_eq!(state.get_run(&cluster_id, &run_id).unwrap().status, acp_core::RunStatus::Done);

    // Finishing again is a no-op; failure_reason should never appear.
    state.apply(&Op::RunFailed {
        cluster_id,
        run_id: run_id.clone(),
        reason: "should not apply".into(),
    });
    assert!(state.runs.values().next().unwrap().failure_reason.is_none());
}

#[test]
fn memo_replace_vs_do_nothing() {
    use acp_core::{MemoConflictPolicy, MemoValue, WorkflowExecutionId};

    let mut state = MaterializedState::default();
    let execution_id = WorkflowExecutionId::new("wfe_1");
    state.apply(&Op::MemoSet {
        execution_id: execution_id.clone(),
        key: "step1".into(),
        value: MemoValue::new(json!(1)),
        policy: MemoConflictPolicy::Replace,
    });
    state.apply(&Op::MemoSet {
        execution_id: execution_id.clone(),
        key: "step1".into(),
        value: MemoValue::new(json!(2)),
        policy: MemoConflictPolicy::DoNothing,
    });
    assert_eq!(state.get_memo(&execution_id, "step1").unwrap().value, json!(1));

    state.apply(&Op::MemoSet {
        execution_id: execution_id.clone(),
        key: "step1".into(),
        value: MemoValue::new(json!(3)),
        policy: MemoConflictPolicy::Replace,
    });
    assert_eq!(state.get_memo(&execution_id, "step1").unwrap().value, json!(3));
}

#[test]
fn message_transcript_appends_in_order_and_ignores_duplicates() {
    use acp_core::{Message, MessageId, MessageKind};

    let mut state = MaterializedState::default();
    let run_id = RunId::new("run_1");
    let m1 = Message::new(
        MessageId::new("0000000000001-a"),
        run_id.clone(),
        1,
        MessageKind::Human { content: "hi".into() },
    );
    let m2 = Message::new(
        MessageId::new("0000000000002-b"),
        run_id.clone(),
        2,
        MessageKind::Human { content: "there".into() },
    );
    state.apply(&Op::MessageAppended(Box::new(m1.clone())));
    state.apply(&Op::MessageAppended(Box::new(m2)));
    state.apply(&Op::MessageAppended(Box::new(m1)));

    assert_eq!(state.messages_for_run(&run_id).len(), 2);
}

#[test]
fn cluster_upsert_overwrites_existing_record() {
    let mut state = MaterializedState::default();
    let cluster = Cluster::new(ClusterId::new("cls"), "acme");
    state.apply(&Op::ClusterUpserted(cluster));
    let mut renamed = state.clusters.get(&ClusterId::new("cls")).unwrap().clone();
    renamed.name = "acme-renamed".into();
    state.apply(&Op::ClusterUpserted(renamed));
    assert_eq!(state.clusters.get(&ClusterId::new("cls")).unwrap().name, "acme-renamed");
}
