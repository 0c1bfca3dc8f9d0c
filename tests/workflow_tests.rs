// Approval workflow tests against a scripted matching service

use async_trait::async_trait;
use placement_engine::core::EligibilityClassifier;
use placement_engine::models::{
    ApproveResponse, CandidateJobMatch, CandidateProfile, EligibilityStatus, FetchMatchesResponse,
    JobEligibilityCriteria, JobSummary, MatchEntry, MatchQuery, StudentRecord,
};
use placement_engine::services::{MatchingService, MatchingServiceError};
use placement_engine::workflow::{
    ApprovalController, ApprovalOutcome, FetchOutcome, ListState, SessionContext,
};
use placement_engine::WorkflowError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_test::{assert_pending, assert_ready, task};

type FetchResult = Result<FetchMatchesResponse, MatchingServiceError>;
type ApproveResult = Result<ApproveResponse, MatchingServiceError>;

/// Matching service whose responses are released by the test
#[derive(Default)]
struct ScriptedService {
    fetch_gates: Mutex<VecDeque<oneshot::Receiver<FetchResult>>>,
    approve_gates: Mutex<VecDeque<oneshot::Receiver<ApproveResult>>>,
    fallback: Mutex<Option<FetchMatchesResponse>>,
    fetch_calls: AtomicUsize,
    approve_calls: AtomicUsize,
    queries: Mutex<Vec<MatchQuery>>,
}

impl ScriptedService {
    fn gate_fetch(&self) -> oneshot::Sender<FetchResult> {
        let (tx, rx) = oneshot::channel();
        self.fetch_gates.lock().unwrap().push_back(rx);
        tx
    }

    fn script_fetch(&self, result: FetchResult) {
        assert!(self.gate_fetch().send(result).is_ok());
    }

    fn gate_approve(&self) -> oneshot::Sender<ApproveResult> {
        let (tx, rx) = oneshot::channel();
        self.approve_gates.lock().unwrap().push_back(rx);
        tx
    }

    fn script_approve(&self, result: ApproveResult) {
        assert!(self.gate_approve().send(result).is_ok());
    }

    fn set_fallback(&self, response: FetchMatchesResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn approve_calls(&self) -> usize {
        self.approve_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchingService for ScriptedService {
    async fn fetch_matches(&self, query: &MatchQuery) -> FetchResult {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.clone());

        let gate = self.fetch_gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(MatchingServiceError::Unavailable("gate dropped".into()))),
            None => {
                let fallback = self.fallback.lock().unwrap().clone();
                fallback.ok_or_else(|| MatchingServiceError::Unavailable("no scripted response".into()))
            }
        }
    }

    async fn approve(&self, _job_source: &str, _job_id: &str, _student_id: &str) -> ApproveResult {
        self.approve_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.approve_gates.lock().unwrap().pop_front();
        match gate {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(MatchingServiceError::Unavailable("gate dropped".into()))),
            None => Ok(ApproveResponse { success: true, error: None }),
        }
    }
}

fn base_query() -> MatchQuery {
    MatchQuery::new("campus", "42")
}

fn create_entry(student_id: &str, score: f64, approved: bool) -> MatchEntry {
    MatchEntry {
        student: StudentRecord {
            id: student_id.to_string(),
            name: format!("Student {}", student_id),
            email: None,
            profile: CandidateProfile {
                cgpa: 8.0,
                branch: "CSE".to_string(),
                batch: 2025,
                has_active_backlogs: false,
                skills: vec!["Rust".to_string()],
            },
        },
        candidate_match: CandidateJobMatch {
            id: format!("m-{}", student_id),
            student_id: student_id.to_string(),
            job_id: "42".to_string(),
            match_score: score,
            skill_match_score: None,
            ats_score: None,
            approved,
        },
    }
}

fn create_response(entries: Vec<MatchEntry>) -> FetchMatchesResponse {
    FetchMatchesResponse {
        job: JobSummary {
            id: "42".to_string(),
            title: "Backend Engineer".to_string(),
            company: Some("Acme".to_string()),
            eligibility: None,
        },
        total: entries.len(),
        matches: entries,
    }
}

fn create_controller(service: &Arc<ScriptedService>) -> ApprovalController<ScriptedService> {
    let session = SessionContext {
        admin_id: "admin-1".to_string(),
        query: base_query(),
    };
    ApprovalController::new(service.clone(), session, EligibilityClassifier::default()).unwrap()
}

fn shown_students(controller: &ApprovalController<ScriptedService>) -> Vec<String> {
    controller
        .view()
        .rows
        .iter()
        .map(|row| row.entry.student.id.clone())
        .collect()
}

#[test]
fn test_last_issued_fetch_wins_when_older_resolves_last() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    let gate_a = service.gate_fetch();
    let gate_b = service.gate_fetch();

    let mut fetch_a = task::spawn(controller.load());
    assert_pending!(fetch_a.poll());

    let mut capped = base_query();
    capped.max_score_threshold = Some(80.0);
    let mut fetch_b = task::spawn(controller.set_query(capped));
    assert_pending!(fetch_b.poll());

    assert!(gate_b.send(Ok(create_response(vec![create_entry("new", 75.0, false)]))).is_ok());
    assert_eq!(assert_ready!(fetch_b.poll()), Ok(FetchOutcome::Committed));

    assert!(gate_a.send(Ok(create_response(vec![create_entry("old", 95.0, false)]))).is_ok());
    assert_eq!(assert_ready!(fetch_a.poll()), Ok(FetchOutcome::Superseded));

    assert_eq!(shown_students(&controller), vec!["new"]);
    assert_eq!(controller.view().state, ListState::Ready);
    assert_eq!(service.fetch_calls(), 2);
}

#[test]
fn test_stale_response_ignored_while_newer_fetch_pending() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    let gate_a = service.gate_fetch();
    let gate_b = service.gate_fetch();

    let mut fetch_a = task::spawn(controller.load());
    assert_pending!(fetch_a.poll());
    let mut fetch_b = task::spawn(controller.refresh());
    assert_pending!(fetch_b.poll());

    assert!(gate_a.send(Ok(create_response(vec![create_entry("old", 50.0, false)]))).is_ok());
    assert_eq!(assert_ready!(fetch_a.poll()), Ok(FetchOutcome::Superseded));
    assert!(controller.view().is_loading());
    assert!(controller.view().rows.is_empty());

    assert!(gate_b.send(Ok(create_response(vec![create_entry("new", 60.0, false)]))).is_ok());
    assert_eq!(assert_ready!(fetch_b.poll()), Ok(FetchOutcome::Committed));
    assert_eq!(shown_students(&controller), vec!["new"]);
}

#[test]
fn test_stale_error_is_not_surfaced() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    let gate_a = service.gate_fetch();
    let gate_b = service.gate_fetch();

    let mut fetch_a = task::spawn(controller.load());
    assert_pending!(fetch_a.poll());
    let mut fetch_b = task::spawn(controller.refresh());
    assert_pending!(fetch_b.poll());

    assert!(gate_b.send(Ok(create_response(vec![create_entry("s1", 60.0, false)]))).is_ok());
    assert_eq!(assert_ready!(fetch_b.poll()), Ok(FetchOutcome::Committed));

    assert!(gate_a.send(Err(MatchingServiceError::Unavailable("timeout".into()))).is_ok());
    assert_eq!(assert_ready!(fetch_a.poll()), Ok(FetchOutcome::Superseded));

    let view = controller.view();
    assert_eq!(view.error(), None);
    assert_eq!(view.state, ListState::Ready);
}

#[test]
fn test_double_approve_sends_one_request() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.set_fallback(create_response(vec![create_entry("s1", 70.0, true)]));
    let gate = service.gate_approve();

    let mut first = task::spawn(controller.approve("s1"));
    assert_pending!(first.poll());

    let mut second = task::spawn(controller.approve("s1"));
    assert_eq!(
        assert_ready!(second.poll()),
        Err(WorkflowError::ApprovalInProgress { student_id: "s1".to_string() })
    );
    assert_eq!(service.approve_calls(), 1);

    assert!(gate.send(Ok(ApproveResponse { success: true, error: None })).is_ok());
    assert!(first.is_woken());
    assert_eq!(assert_ready!(first.poll()), Ok(ApprovalOutcome::Approved));

    let mut third = task::spawn(controller.approve("s1"));
    assert_eq!(assert_ready!(third.poll()), Ok(ApprovalOutcome::AlreadyApproved));
    assert_eq!(service.approve_calls(), 1);
}

#[tokio::test]
async fn test_approval_refetches_with_new_generation() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.script_fetch(Ok(create_response(vec![create_entry("s1", 70.0, false)])));
    service.script_fetch(Ok(create_response(vec![create_entry("s1", 70.0, true)])));

    assert_eq!(controller.load().await, Ok(FetchOutcome::Committed));
    assert_eq!(controller.view().generation, 0);

    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));

    let view = controller.view();
    assert_eq!(service.fetch_calls(), 2);
    assert_eq!(view.generation, 1);
    assert!(view.rows[0].entry.candidate_match.approved);
}

#[tokio::test]
async fn test_approved_row_skips_network() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.script_fetch(Ok(create_response(vec![create_entry("s1", 70.0, true)])));

    controller.load().await.unwrap();

    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::AlreadyApproved));
    assert_eq!(service.approve_calls(), 0);
}

#[tokio::test]
async fn test_application_rejection_reverts_state() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.set_fallback(create_response(vec![create_entry("s1", 70.0, true)]));
    service.script_approve(Ok(ApproveResponse {
        success: false,
        error: Some("job is closed".to_string()),
    }));

    assert_eq!(
        controller.approve("s1").await,
        Err(WorkflowError::Application("job is closed".to_string()))
    );
    assert_eq!(service.fetch_calls(), 0);

    // reverted to unapproved, so a retry goes out again
    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));
    assert_eq!(service.approve_calls(), 2);
}

#[tokio::test]
async fn test_transport_failure_reverts_state() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.script_approve(Err(MatchingServiceError::Unavailable("connection refused".into())));

    let err = controller.approve("s9").await.unwrap_err();
    assert_eq!(err.code(), "transport_error");
    assert!(err.to_string().contains("connection refused"));

    service.set_fallback(create_response(vec![]));
    assert_eq!(controller.approve("s9").await, Ok(ApprovalOutcome::Approved));
}

#[tokio::test]
async fn test_refetch_failure_does_not_fail_approval() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.script_fetch(Err(MatchingServiceError::Unavailable("gateway timeout".into())));

    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));
    assert!(controller.view().error().is_some());
}

#[tokio::test]
async fn test_invalid_query_issues_no_request() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);

    let err = controller
        .set_query(MatchQuery::new("campus", "forty-two"))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Validation(_)));
    assert_eq!(service.fetch_calls(), 0);
    assert_eq!(controller.query(), base_query());
}

#[tokio::test]
async fn test_limit_change_does_not_refetch() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    let mut wider = base_query();
    wider.limit = 100;

    assert_eq!(controller.set_query(wider).await, Ok(FetchOutcome::Unchanged));
    assert_eq!(service.fetch_calls(), 0);
    assert_eq!(controller.query().limit, 100);
}

#[tokio::test]
async fn test_filter_change_refetches_with_new_query() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.set_fallback(create_response(vec![]));
    let mut approved_only = base_query();
    approved_only.approved_only = true;

    assert_eq!(controller.set_query(approved_only).await, Ok(FetchOutcome::Committed));

    let queries = service.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert!(queries[0].approved_only);
}

#[tokio::test]
async fn test_view_ranks_filters_and_annotates() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);

    let mut response = create_response(vec![
        create_entry("a", 40.0, false),
        create_entry("b", 90.0, false),
        create_entry("c", 65.0, false),
        create_entry("d", 65.0, false),
    ]);
    response.job.eligibility = Some(JobEligibilityCriteria {
        min_cgpa: 7.0,
        eligible_branches: ["CSE".to_string()].into_iter().collect(),
        eligible_batches: [2025].into_iter().collect(),
        no_backlogs_allowed: true,
        required_skills: vec!["Rust".to_string(), "Kafka".to_string()],
    });
    service.set_fallback(response);

    let mut capped = base_query();
    capped.max_score_threshold = Some(70.0);
    controller.set_query(capped).await.unwrap();

    let view = controller.view();
    assert_eq!(shown_students(&controller), vec!["c", "d", "a"]);
    assert_eq!(view.total, 4);
    for row in &view.rows {
        let eligibility = row.eligibility.as_ref().unwrap();
        assert_eq!(eligibility.status, EligibilityStatus::PartiallyEligible);
        assert_eq!(eligibility.reasons, vec!["missing some skills: Kafka"]);
    }
}

#[tokio::test]
async fn test_state_flags() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);

    service.script_fetch(Ok(create_response(vec![])));
    controller.load().await.unwrap();
    let view = controller.view();
    assert!(view.is_empty() && !view.is_loading() && view.error().is_none());

    service.script_fetch(Err(MatchingServiceError::ApiError {
        status: 500,
        message: "boom".to_string(),
    }));
    assert!(controller.refresh().await.is_err());
    let view = controller.view();
    assert!(!view.is_empty() && !view.is_loading());
    assert!(view.error().unwrap().contains("boom"));
}

#[test]
fn test_approval_supersedes_fetch_already_in_flight() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    let stale_gate = service.gate_fetch();
    service.set_fallback(create_response(vec![create_entry("fresh", 70.0, true)]));

    let mut load = task::spawn(controller.load());
    assert_pending!(load.poll());

    let mut approve = task::spawn(controller.approve("fresh"));
    assert_eq!(assert_ready!(approve.poll()), Ok(ApprovalOutcome::Approved));
    assert_eq!(controller.view().generation, 1);

    assert!(stale_gate
        .send(Ok(create_response(vec![create_entry("stale", 99.0, false)])))
        .is_ok());
    assert_eq!(assert_ready!(load.poll()), Ok(FetchOutcome::Superseded));

    assert_eq!(shown_students(&controller), vec!["fresh"]);
    assert_eq!(service.fetch_calls(), 2);
}

#[tokio::test]
async fn test_alternate_job_id_spelling_cannot_repeat_approval() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.set_fallback(create_response(vec![]));

    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));

    for job_id in ["+42", " 42", "042"] {
        let err = controller
            .set_query(MatchQuery::new("campus", job_id))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)), "{:?}", job_id);
    }

    assert_eq!(controller.query().job_id, "42");
    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::AlreadyApproved));
    assert_eq!(service.approve_calls(), 1);
    assert!(service.queries.lock().unwrap().iter().all(|q| q.job_id == "42"));
}

#[tokio::test]
async fn test_switching_jobs_forgets_settled_approvals() {
    let service = Arc::new(ScriptedService::default());
    let controller = create_controller(&service);
    service.set_fallback(create_response(vec![]));

    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));

    controller.set_query(MatchQuery::new("campus", "43")).await.unwrap();
    controller.set_query(base_query()).await.unwrap();

    // the service stays authoritative once the local record is gone
    assert_eq!(controller.approve("s1").await, Ok(ApprovalOutcome::Approved));
    assert_eq!(service.approve_calls(), 2);
}
