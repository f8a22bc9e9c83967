use std::{
    collections::VecDeque,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tack_core::{
    ArtifactPublisher, ChainOfTrust, ClaimQueue, Collaborators, Context, CoreError, Event,
    EventKind, Orchestrator, Outcome, Stage, Subscribe, TaskExecutor, TaskProcess, TrustVerifier,
    Worker, WorkerConfig, WorkerError,
};
use tack_model::{ClaimedTask, Credentials, ExitStatus, Lease, TaskId, WorkClaim};
use tokio::sync::Notify;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeQueue {
    claims: Mutex<VecDeque<Result<WorkClaim, CoreError>>>,
    claim_calls: AtomicUsize,
    renewals: AtomicUsize,
    renewed_credentials: Mutex<Option<Credentials>>,
    completed: Mutex<Vec<(TaskId, ExitStatus)>>,
}

impl FakeQueue {
    fn with_claims(claims: Vec<Result<WorkClaim, CoreError>>) -> Arc<Self> {
        Arc::new(Self {
            claims: Mutex::new(claims.into()),
            ..Default::default()
        })
    }

    fn completed(&self) -> Vec<(TaskId, ExitStatus)> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClaimQueue for FakeQueue {
    async fn claim_work(&self) -> Result<WorkClaim, CoreError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.claims
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(WorkClaim::empty()))
    }

    async fn renew(&self, _task: &ClaimedTask) -> Result<Lease, CoreError> {
        self.renewals.fetch_add(1, Ordering::SeqCst);
        Ok(Lease {
            taken_until: Some("later".into()),
            credentials: self.renewed_credentials.lock().unwrap().clone(),
        })
    }

    async fn complete(&self, task: &ClaimedTask, status: ExitStatus) -> Result<(), CoreError> {
        self.completed
            .lock()
            .unwrap()
            .push((task.task_id.clone(), status));
        Ok(())
    }
}

#[derive(Default)]
struct PendingVerifier {
    entered: Notify,
}

#[async_trait]
impl TrustVerifier for PendingVerifier {
    async fn verify(&self, _chain: &ChainOfTrust) -> Result<(), CoreError> {
        self.entered.notify_one();
        std::future::pending().await
    }
}

#[derive(Clone, Debug)]
enum Run {
    Exit(ExitStatus),
    Fail(ExitStatus),
    Sleep(Duration, ExitStatus),
    UntilStopped,
    SpawnFatal,
}

struct FakeProcess {
    run: Run,
    stops: AtomicUsize,
    stopped: Notify,
}

#[async_trait]
impl TaskProcess for FakeProcess {
    fn pid(&self) -> Option<u32> {
        Some(4242)
    }

    fn stop_for_shutdown(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.stopped.notify_one();
    }

    async fn wait(&self) -> Result<ExitStatus, CoreError> {
        match &self.run {
            Run::Exit(s) => Ok(*s),
            Run::Fail(s) => Err(WorkerError::new(*s, "task failed").into()),
            Run::Sleep(d, s) => {
                tokio::time::sleep(*d).await;
                Ok(*s)
            }
            Run::UntilStopped => {
                self.stopped.notified().await;
                Ok(ExitStatus::WorkerShutdown)
            }
            Run::SpawnFatal => unreachable!(),
        }
    }
}

#[derive(Default)]
struct FakeExecutor {
    runs: Mutex<VecDeque<Run>>,
    spawned: Mutex<Vec<Arc<FakeProcess>>>,
    spawned_signal: Notify,
}

impl FakeExecutor {
    fn with_runs(runs: Vec<Run>) -> Arc<Self> {
        Arc::new(Self {
            runs: Mutex::new(runs.into()),
            ..Default::default()
        })
    }

    fn spawned(&self) -> Vec<Arc<FakeProcess>> {
        self.spawned.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExecutor for FakeExecutor {
    async fn spawn(&self, _task: &ClaimedTask) -> Result<Arc<dyn TaskProcess>, CoreError> {
        let run = self
            .runs
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Run::Exit(ExitStatus::Success));
        if let Run::SpawnFatal = run {
            return Err(CoreError::Unexpected("executor exploded".into()));
        }
        let process = Arc::new(FakeProcess {
            run,
            stops: AtomicUsize::new(0),
            stopped: Notify::new(),
        });
        self.spawned.lock().unwrap().push(Arc::clone(&process));
        self.spawned_signal.notify_one();
        Ok(process)
    }
}

#[derive(Default)]
struct FakePublisher {
    failure: Mutex<Option<CoreError>>,
    seen: Mutex<Vec<ClaimedTask>>,
    artifact_dir: Mutex<Option<PathBuf>>,
    listed: Mutex<Vec<String>>,
}

impl FakePublisher {
    fn failing(e: CoreError) -> Arc<Self> {
        Arc::new(Self {
            failure: Mutex::new(Some(e)),
            ..Default::default()
        })
    }
}

#[async_trait]
impl ArtifactPublisher for FakePublisher {
    async fn upload(&self, task: &ClaimedTask) -> Result<(), CoreError> {
        self.seen.lock().unwrap().push(task.clone());
        if let Some(dir) = self.artifact_dir.lock().unwrap().clone() {
            let files = tack_core::fs::collect_files(&dir).unwrap();
            self.listed
                .lock()
                .unwrap()
                .extend(files.into_iter().map(|(rel, _)| rel));
        }
        match self.failure.lock().unwrap().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    task_file: Mutex<Option<PathBuf>>,
    task_file_at_lease_start: Mutex<Vec<bool>>,
}

impl Recorder {
    fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }
}

impl Subscribe for Recorder {
    fn on_event(&self, event: &Event) {
        if event.kind == EventKind::LeaseStarted {
            if let Some(path) = self.task_file.lock().unwrap().as_ref() {
                self.task_file_at_lease_start
                    .lock()
                    .unwrap()
                    .push(path.exists());
            }
        }
        self.events.lock().unwrap().push(event.clone());
    }
    fn name(&self) -> &'static str {
        "recorder"
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    ctx: Arc<Context>,
    queue: Arc<FakeQueue>,
    executor: Arc<FakeExecutor>,
    publisher: Arc<FakePublisher>,
    events: Arc<Recorder>,
    _tmp: tempfile::TempDir,
}

fn config(root: &Path) -> WorkerConfig {
    WorkerConfig {
        work_dir: root.join("work"),
        artifact_dir: root.join("artifacts"),
        task_log_dir: root.join("logs"),
        poll_interval_ms: 10_000,
        reclaim_interval_ms: 1_000,
        ..Default::default()
    }
}

fn harness(
    queue: Arc<FakeQueue>,
    executor: Arc<FakeExecutor>,
    publisher: Arc<FakePublisher>,
    verifier: Option<Arc<dyn TrustVerifier>>,
) -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path());
    cfg.verify_chain_of_trust = verifier.is_some();

    let events = Arc::new(Recorder::default());
    *events.task_file.lock().unwrap() = Some(cfg.work_dir.join(tack_core::fs::TASK_FILE));
    *publisher.artifact_dir.lock().unwrap() = Some(cfg.artifact_dir.clone());
    let ctx = Context::new(
        cfg,
        Collaborators {
            queue: queue.clone(),
            verifier,
            executor: executor.clone(),
            publisher: publisher.clone(),
        },
    )
    .with_subscribers(vec![events.clone() as Arc<dyn Subscribe>]);

    Harness {
        ctx: Arc::new(ctx),
        queue,
        executor,
        publisher,
        events,
        _tmp: tmp,
    }
}

fn task(id: &str) -> ClaimedTask {
    ClaimedTask::new(id, 0, serde_json::json!({"payload": {}}))
}

fn one_task(id: &str) -> Vec<Result<WorkClaim, CoreError>> {
    vec![Ok(WorkClaim::single(task(id)))]
}

fn assert_lease_released(h: &Harness) {
    assert_eq!(
        h.events.count(EventKind::LeaseStarted),
        h.events.count(EventKind::LeaseStopped),
        "events: {:?}",
        h.events.kinds()
    );
    assert!(!h.ctx.has_running());
    assert!(h.ctx.task().is_none());
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn no_work_sleeps_poll_interval_and_reports_nothing() {
    let h = harness(
        FakeQueue::with_claims(vec![]),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let worker = Worker::new(h.ctx.clone());

    let start = tokio::time::Instant::now();
    let outcome = worker.run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Idle);
    assert_eq!(outcome.status(), None);
    assert!(start.elapsed() >= Duration::from_millis(10_000));
    assert_eq!(h.queue.claim_calls.load(Ordering::SeqCst), 1);
    assert!(h.queue.completed().is_empty());
    assert!(!h.ctx.has_running());
}

#[tokio::test]
async fn successful_task_reports_success() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::Success)]),
        Arc::new(FakePublisher::default()),
        None,
    );

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::Success));
    assert_eq!(h.queue.completed(), vec![(TaskId::from("t1"), ExitStatus::Success)]);
    assert_eq!(h.events.count(EventKind::VerificationSkipped), 1);
    assert_eq!(h.events.count(EventKind::TaskResolved), 1);
    assert_lease_released(&h);
}

#[tokio::test]
async fn upload_success_does_not_downgrade_task_failure() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Fail(ExitStatus::InternalError)]),
        Arc::new(FakePublisher::default()),
        None,
    );

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::InternalError));
    assert_eq!(
        h.queue.completed(),
        vec![(TaskId::from("t1"), ExitStatus::InternalError)]
    );
    // Upload still ran after the failed execution.
    assert_eq!(h.publisher.seen.lock().unwrap().len(), 1);
    assert_lease_released(&h);
}

#[tokio::test]
async fn upload_transport_error_is_intermittent() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::Success)]),
        FakePublisher::failing(CoreError::Transport("connection reset".into())),
        None,
    );

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::IntermittentTask));
    assert_eq!(
        h.queue.completed(),
        vec![(TaskId::from("t1"), ExitStatus::IntermittentTask)]
    );
    assert_lease_released(&h);
}

#[tokio::test]
async fn most_severe_stage_wins_in_either_order() {
    // Execution worse than upload.
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Fail(ExitStatus::IntermittentTask)]),
        FakePublisher::failing(WorkerError::new(ExitStatus::Failure, "bad artifact").into()),
        None,
    );
    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();
    assert_eq!(outcome, Outcome::Finished(ExitStatus::IntermittentTask));

    // Upload worse than execution.
    let h = harness(
        FakeQueue::with_claims(one_task("t2")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::WorkerShutdown)]),
        FakePublisher::failing(WorkerError::new(ExitStatus::InternalError, "bad artifact").into()),
        None,
    );
    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();
    assert_eq!(outcome, Outcome::Finished(ExitStatus::InternalError));
}

#[tokio::test]
async fn shutdown_during_verification_reports_worker_shutdown_and_stops_loop() {
    let verifier = Arc::new(PendingVerifier::default());
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        Some(verifier.clone() as Arc<dyn TrustVerifier>),
    );
    let worker = Worker::new(h.ctx.clone());
    let shutdown = worker.shutdown_handle();
    let running = tokio::spawn(async move { worker.run().await });

    verifier.entered.notified().await;
    shutdown.shutdown();

    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("worker did not stop")
        .unwrap()
        .unwrap();

    assert_eq!(
        h.queue.completed(),
        vec![(TaskId::from("t1"), ExitStatus::WorkerShutdown)]
    );
    assert_eq!(h.queue.claim_calls.load(Ordering::SeqCst), 1);
    assert!(h.executor.spawned().is_empty());
    assert_eq!(h.events.count(EventKind::ShutdownRequested), 1);
    assert_lease_released(&h);
}

#[tokio::test]
async fn cancelled_before_start_never_claims() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let orchestrator = Orchestrator::new();
    orchestrator.token().cancel();

    let outcome = orchestrator.invoke(&h.ctx).await.unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(h.queue.claim_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.events.count(EventKind::IterationCancelled), 1);
}

#[tokio::test]
async fn shutdown_while_idle_stops_before_next_claim() {
    let h = harness(
        FakeQueue::with_claims(vec![]),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let worker = Worker::new(h.ctx.clone());
    worker.shutdown_handle().shutdown();

    worker.run().await.unwrap();

    assert_eq!(h.queue.claim_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn shutdown_during_poll_sleep_cancels_iteration() {
    let h = harness(
        FakeQueue::with_claims(vec![]),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let worker = Worker::new(h.ctx.clone());
    let shutdown = worker.shutdown_handle();
    let ctx = h.ctx.clone();

    let running = tokio::spawn(async move { worker.run().await });
    while h.queue.claim_calls.load(Ordering::SeqCst) == 0 || !ctx.has_running() {
        tokio::task::yield_now().await;
    }
    shutdown.shutdown();

    tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("worker did not stop")
        .unwrap()
        .unwrap();
    assert_eq!(h.events.count(EventKind::IterationCancelled), 1);
    assert!(!h.ctx.has_running());
}

#[tokio::test]
async fn shutdown_during_execution_stops_process_exactly_once() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::UntilStopped]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let worker = Arc::new(Worker::new(h.ctx.clone()));
    let fg = Arc::clone(&worker);
    let running = tokio::spawn(async move { fg.run_tasks().await });

    h.executor.spawned_signal.notified().await;
    while !h.ctx.has_running() || h.events.count(EventKind::ProcessAdopted) == 0 {
        tokio::task::yield_now().await;
    }
    assert!(h.ctx.cancel_running());
    h.ctx.cancel_running();
    worker.shutdown_handle().shutdown();

    let outcome = running.await.unwrap().unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::WorkerShutdown));
    let spawned = h.executor.spawned();
    assert_eq!(spawned.len(), 1);
    assert_eq!(spawned[0].stops.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.queue.completed(),
        vec![(TaskId::from("t1"), ExitStatus::WorkerShutdown)]
    );
    assert_lease_released(&h);
}

#[tokio::test(start_paused = true)]
async fn lease_renewal_never_outlives_its_iteration() {
    let cases = vec![
        (Run::Sleep(Duration::from_millis(3_500), ExitStatus::Success), None),
        (Run::Fail(ExitStatus::MalformedPayload), None),
        (
            Run::Sleep(Duration::from_millis(2_500), ExitStatus::Success),
            Some(CoreError::Transport("timeout".into())),
        ),
    ];

    for (run, upload_failure) in cases {
        let publisher = match upload_failure {
            Some(e) => FakePublisher::failing(e),
            None => Arc::new(FakePublisher::default()),
        };
        let h = harness(
            FakeQueue::with_claims(one_task("t1")),
            FakeExecutor::with_runs(vec![run]),
            publisher,
            None,
        );

        Worker::new(h.ctx.clone()).run_tasks().await.unwrap();
        let renewals = h.queue.renewals.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_millis(10_000)).await;

        assert_eq!(h.queue.renewals.load(Ordering::SeqCst), renewals);
        assert_lease_released(&h);
    }
}

#[tokio::test(start_paused = true)]
async fn renewed_credentials_reach_the_publisher() {
    let queue = FakeQueue::with_claims(one_task("t1"));
    *queue.renewed_credentials.lock().unwrap() = Some(Credentials::new("task-client", "fresh"));
    let h = harness(
        queue,
        FakeExecutor::with_runs(vec![Run::Sleep(
            Duration::from_millis(2_500),
            ExitStatus::Success,
        )]),
        Arc::new(FakePublisher::default()),
        None,
    );

    Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert!(h.queue.renewals.load(Ordering::SeqCst) >= 2);
    let seen = h.publisher.seen.lock().unwrap();
    assert_eq!(
        seen[0].lease.credentials.as_ref().map(|c| c.client_id.as_str()),
        Some("task-client")
    );
    assert_eq!(seen[0].lease.taken_until.as_deref(), Some("later"));
}

#[tokio::test]
async fn unexpected_failure_is_fatal_and_leaves_context_clean() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::SpawnFatal]),
        Arc::new(FakePublisher::default()),
        None,
    );

    let err = Worker::new(h.ctx.clone()).run().await.unwrap_err();

    assert!(matches!(err, CoreError::Unexpected(_)));
    assert!(h.queue.completed().is_empty());
    assert_eq!(h.events.count(EventKind::UnexpectedFailure), 1);
    assert_lease_released(&h);
}

#[tokio::test(start_paused = true)]
async fn claim_transport_error_is_treated_as_no_work() {
    let h = harness(
        FakeQueue::with_claims(vec![Err(CoreError::Transport("dns".into()))]),
        FakeExecutor::with_runs(vec![]),
        Arc::new(FakePublisher::default()),
        None,
    );

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Idle);
    assert_eq!(h.events.count(EventKind::ClaimFailed), 1);
}

#[tokio::test]
async fn several_tasks_in_one_claim_report_the_last_status() {
    let h = harness(
        FakeQueue::with_claims(vec![Ok(WorkClaim {
            tasks: vec![task("t1"), task("t2")],
        })]),
        FakeExecutor::with_runs(vec![
            Run::Fail(ExitStatus::InternalError),
            Run::Exit(ExitStatus::Success),
        ]),
        Arc::new(FakePublisher::default()),
        None,
    );

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::Success));
    assert_eq!(
        h.queue.completed(),
        vec![
            (TaskId::from("t1"), ExitStatus::InternalError),
            (TaskId::from("t2"), ExitStatus::Success),
        ]
    );
    assert_eq!(h.events.count(EventKind::LeaseStarted), 2);
    assert_lease_released(&h);
}

#[tokio::test]
async fn task_definition_is_written_before_lease_starts() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::Success)]),
        Arc::new(FakePublisher::default()),
        None,
    );

    Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(*h.events.task_file_at_lease_start.lock().unwrap(), vec![true]);
    assert_lease_released(&h);
}

#[tokio::test]
async fn chain_of_trust_artifact_is_uploaded_with_task_outputs() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::Failure)]),
        Arc::new(FakePublisher::default()),
        None,
    );
    let artifacts = h.ctx.config().artifact_dir.clone();
    std::fs::create_dir_all(artifacts.join("public")).unwrap();
    std::fs::write(artifacts.join("public/build.log"), "hello").unwrap();

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    // A failing task still gets its chain of trust; the task status is kept.
    assert_eq!(outcome, Outcome::Finished(ExitStatus::Failure));
    assert_eq!(
        *h.publisher.listed.lock().unwrap(),
        vec!["public/build.log", tack_core::cot::COT_FILE]
    );
    assert_eq!(h.events.count(EventKind::StageFailed), 0);
}

#[tokio::test]
async fn chain_of_trust_generation_failure_is_folded_into_status() {
    let h = harness(
        FakeQueue::with_claims(one_task("t1")),
        FakeExecutor::with_runs(vec![Run::Exit(ExitStatus::Success)]),
        Arc::new(FakePublisher::default()),
        None,
    );
    // A directory where the artifact should go makes the write fail.
    let blocked = h.ctx.config().artifact_dir.join(tack_core::cot::COT_FILE);
    std::fs::create_dir_all(&blocked).unwrap();

    let outcome = Worker::new(h.ctx.clone()).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::InternalError));
    assert_eq!(
        h.queue.completed(),
        vec![(TaskId::from("t1"), ExitStatus::InternalError)]
    );
    let failed: Vec<Event> = h
        .events
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.kind == EventKind::StageFailed)
        .cloned()
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].stage, Some(Stage::Generating));
    // Upload still ran.
    assert_eq!(h.publisher.seen.lock().unwrap().len(), 1);
    assert_lease_released(&h);
}

#[tokio::test]
async fn chain_of_trust_generation_can_be_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let mut cfg = config(tmp.path());
    cfg.generate_chain_of_trust = false;
    let publisher = Arc::new(FakePublisher::default());
    *publisher.artifact_dir.lock().unwrap() = Some(cfg.artifact_dir.clone());
    let ctx = Arc::new(Context::new(
        cfg,
        Collaborators {
            queue: FakeQueue::with_claims(one_task("t1")),
            verifier: None,
            executor: FakeExecutor::with_runs(vec![]),
            publisher: publisher.clone(),
        },
    ));

    let outcome = Worker::new(ctx).run_tasks().await.unwrap();

    assert_eq!(outcome, Outcome::Finished(ExitStatus::Success));
    assert!(publisher.listed.lock().unwrap().is_empty());
}
