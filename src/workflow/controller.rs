use crate::core::{rank_and_filter_by, EligibilityClassifier};
use crate::error::WorkflowError;
use crate::models::{FetchMatchesResponse, JobSummary, MatchQuery, MatchRow};
use crate::services::MatchingService;
use crate::workflow::approval::{ApprovalKey, ApprovalLedger, ApprovalOutcome};
use crate::workflow::ticket::FetchSlot;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use validator::Validate;

/// Who is reviewing and what they are looking at
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub admin_id: String,
    pub query: MatchQuery,
}

/// Visible state of the match list. Exactly one variant holds at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum ListState {
    Idle,
    Loading,
    Failed(String),
    Empty,
    Ready,
}

/// Snapshot of what the presentation layer renders
#[derive(Debug, Clone, Serialize)]
pub struct MatchView {
    pub query: MatchQuery,
    pub state: ListState,
    pub job: Option<JobSummary>,
    pub total: usize,
    pub rows: Vec<MatchRow>,
    pub generation: u64,
}

impl MatchView {
    fn idle(query: MatchQuery) -> Self {
        Self {
            query,
            state: ListState::Idle,
            job: None,
            total: 0,
            rows: Vec::new(),
            generation: 0,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state == ListState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ListState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.state == ListState::Empty
    }
}

/// What happened to a fetch request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The response is now the visible list
    Committed,
    /// A newer request was issued first; the response was dropped
    Superseded,
    /// The query did not change in a way that needs a fetch
    Unchanged,
}

struct ControllerState {
    query: MatchQuery,
    view: MatchView,
    fetches: FetchSlot,
    approvals: ApprovalLedger,
}

/// Owns the displayed match list and drives fetch, approve and refetch
/// against the matching service.
///
/// The lock is never held across an await; every suspension point is a call
/// into `S`.
pub struct ApprovalController<S: MatchingService + ?Sized> {
    service: Arc<S>,
    classifier: EligibilityClassifier,
    admin_id: String,
    state: Mutex<ControllerState>,
}

impl<S: MatchingService + ?Sized> ApprovalController<S> {
    pub fn new(
        service: Arc<S>,
        session: SessionContext,
        classifier: EligibilityClassifier,
    ) -> Result<Self, WorkflowError> {
        validate_query(&session.query)?;

        Ok(Self {
            service,
            classifier,
            admin_id: session.admin_id,
            state: Mutex::new(ControllerState {
                view: MatchView::idle(session.query.clone()),
                query: session.query,
                fetches: FetchSlot::new(),
                approvals: ApprovalLedger::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn query(&self) -> MatchQuery {
        self.lock().query.clone()
    }

    pub fn view(&self) -> MatchView {
        self.lock().view.clone()
    }

    /// Fetch the list for the current query
    pub async fn load(&self) -> Result<FetchOutcome, WorkflowError> {
        self.fetch().await
    }

    /// Bump the refresh generation and fetch again
    pub async fn refresh(&self) -> Result<FetchOutcome, WorkflowError> {
        {
            let mut state = self.lock();
            let generation = state.fetches.bump_generation();
            state.view.generation = generation;
        }
        self.fetch().await
    }

    /// Replace the query, fetching if the job or any filter changed
    pub async fn set_query(&self, query: MatchQuery) -> Result<FetchOutcome, WorkflowError> {
        validate_query(&query)?;

        {
            let mut state = self.lock();
            let changed = query.needs_refetch(&state.query);
            state.query = query.clone();
            state.view.query = query;
            if !changed {
                return Ok(FetchOutcome::Unchanged);
            }
            let current = state.query.clone();
            state.approvals.retain_job(&current);
            state.view.job = None;
            state.view.total = 0;
            state.view.rows.clear();
        }

        self.fetch().await
    }

    async fn fetch(&self) -> Result<FetchOutcome, WorkflowError> {
        let (ticket, query) = {
            let mut state = self.lock();
            let ticket = state.fetches.issue();
            state.view.state = ListState::Loading;
            (ticket, state.query.clone())
        };

        debug!(
            "Fetch {} issued for job {}/{} (generation {})",
            ticket.id(),
            query.job_source,
            query.job_id,
            ticket.generation()
        );

        let result = self.service.fetch_matches(&query).await;

        let mut state = self.lock();
        if !state.fetches.complete(&ticket) {
            debug!("Discarding stale response for fetch {}", ticket.id());
            return Ok(FetchOutcome::Superseded);
        }

        match result {
            Ok(response) => {
                self.commit(&mut state, &query, response);
                Ok(FetchOutcome::Committed)
            }
            Err(e) => {
                let err = WorkflowError::from(e);
                warn!("Fetch {} failed: {}", ticket.id(), err);
                state.view.state = ListState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    fn commit(&self, state: &mut ControllerState, query: &MatchQuery, response: FetchMatchesResponse) {
        let ranked = rank_and_filter_by(response.matches, query, |entry| &entry.candidate_match);
        let criteria = response.job.eligibility.as_ref();

        let rows: Vec<MatchRow> = ranked
            .into_iter()
            .map(|entry| {
                if entry.candidate_match.approved {
                    state
                        .approvals
                        .observe_approved(ApprovalKey::new(query, &entry.student.id));
                }
                let eligibility = criteria.map(|c| self.classifier.classify(&entry.student.profile, c));
                MatchRow { entry, eligibility }
            })
            .collect();

        info!(
            "Showing {} of {} matches for job {}",
            rows.len(),
            response.total,
            response.job.id
        );

        state.view.state = if rows.is_empty() {
            ListState::Empty
        } else {
            ListState::Ready
        };
        state.view.job = Some(response.job);
        state.view.total = response.total;
        state.view.rows = rows;
        state.view.generation = state.fetches.generation();
    }

    /// Approve `student_id` for the job under review.
    ///
    /// On success the list is refetched rather than patched locally. A failed
    /// refetch shows up in the list state, not in this result.
    pub async fn approve(&self, student_id: &str) -> Result<ApprovalOutcome, WorkflowError> {
        if student_id.trim().is_empty() {
            return Err(WorkflowError::Validation("student id must not be empty".to_string()));
        }

        let key = {
            let mut state = self.lock();
            let key = ApprovalKey::new(&state.query, student_id);

            let shown_approved = state.view.rows.iter().any(|row| {
                row.entry.student.id == student_id && row.entry.candidate_match.approved
            });
            if shown_approved {
                state.approvals.observe_approved(key.clone());
            }

            if let Some(outcome) = state.approvals.begin(&key)? {
                debug!("Student {} already approved for job {}", student_id, key.job_id);
                return Ok(outcome);
            }
            key
        };

        info!(
            "Admin {} approving student {} for job {}/{}",
            self.admin_id, key.student_id, key.job_source, key.job_id
        );

        let failure = match self
            .service
            .approve(&key.job_source, &key.job_id, &key.student_id)
            .await
        {
            Ok(response) if response.success => None,
            Ok(response) => Some(WorkflowError::Application(
                response
                    .error
                    .unwrap_or_else(|| "approval was rejected by the matching service".to_string()),
            )),
            Err(e) => Some(WorkflowError::from(e)),
        };

        if let Some(err) = failure {
            warn!("Approval of student {} failed: {}", key.student_id, err);
            self.lock().approvals.fail(&key);
            return Err(err);
        }

        {
            let mut state = self.lock();
            state.approvals.succeed(&key);
            let generation = state.fetches.bump_generation();
            state.view.generation = generation;
        }

        if let Err(e) = self.fetch().await {
            warn!("Refetch after approving {} failed: {}", key.student_id, e);
        }

        Ok(ApprovalOutcome::Approved)
    }
}

fn validate_query(query: &MatchQuery) -> Result<(), WorkflowError> {
    query.validate()?;

    // Only the canonical spelling is accepted so one job never has two approval keys
    let canonical = query.job_id.parse::<u64>().ok().map(|id| id.to_string());
    if canonical.as_deref() != Some(query.job_id.as_str()) {
        return Err(WorkflowError::Validation(format!(
            "job id must be a plain unsigned integer, got {:?}",
            query.job_id
        )));
    }
    if let Some(threshold) = query.max_score_threshold {
        if !threshold.is_finite() {
            return Err(WorkflowError::Validation(
                "max score threshold must be a finite number".to_string(),
            ));
        }
    }

    Ok(())
}
