use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{rank_and_filter, EligibilityClassifier};
use crate::error::WorkflowError;
use crate::models::{
    ApprovalResponse, ApproveRequest, ClassifyRequest, ErrorResponse, HealthResponse, MatchQuery,
    RankMatchesRequest, RankMatchesResponse,
};
use crate::services::MatchingService;
use crate::workflow::{ApprovalController, ApprovalOutcome};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<ApprovalController<dyn MatchingService>>,
    pub classifier: EligibilityClassifier,
}

/// Configure eligibility, ranking and review routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/eligibility/classify", web::post().to(classify))
        .route("/matches/rank", web::post().to(rank_matches))
        .route("/review/matches", web::get().to(get_view))
        .route("/review/query", web::put().to(set_query))
        .route("/review/refresh", web::post().to(refresh))
        .route("/review/approve", web::post().to(approve));
}

fn error_response(err: &WorkflowError) -> HttpResponse {
    let body = |status_code: u16| ErrorResponse {
        error: err.code().to_string(),
        message: err.to_string(),
        status_code,
    };

    match err {
        WorkflowError::Validation(_) => HttpResponse::BadRequest().json(body(400)),
        WorkflowError::Transport(_) => HttpResponse::BadGateway().json(body(502)),
        WorkflowError::Application(_) => HttpResponse::UnprocessableEntity().json(body(422)),
        WorkflowError::ApprovalInProgress { .. } => HttpResponse::Conflict().json(body(409)),
    }
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Classify a profile against job criteria
///
/// POST /api/v1/eligibility/classify
async fn classify(
    state: web::Data<AppState>,
    req: web::Json<ClassifyRequest>,
) -> impl Responder {
    let result = state.classifier.classify(&req.profile, &req.criteria);
    HttpResponse::Ok().json(result)
}

/// Rank and filter a caller-supplied match list
///
/// POST /api/v1/matches/rank
///
/// Request body:
/// ```json
/// {
///   "matches": [{ "id": "m1", "studentId": "s1", "jobId": "7", "matchScore": 82.5 }],
///   "query": { "jobSource": "campus", "jobId": "7", "maxScoreThreshold": 90, "approvedOnly": false }
/// }
/// ```
async fn rank_matches(req: web::Json<RankMatchesRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for rank request: {:?}", errors);
        return error_response(&WorkflowError::from(errors));
    }

    let RankMatchesRequest { matches, query } = req.into_inner();
    let matches = rank_and_filter(matches, &query);

    HttpResponse::Ok().json(RankMatchesResponse {
        total_results: matches.len(),
        matches,
    })
}

/// Current view of the match list under review
///
/// GET /api/v1/review/matches
async fn get_view(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.controller.view())
}

/// Replace the review query
///
/// PUT /api/v1/review/query
async fn set_query(
    state: web::Data<AppState>,
    req: web::Json<MatchQuery>,
) -> impl Responder {
    match state.controller.set_query(req.into_inner()).await {
        Ok(outcome) => {
            tracing::debug!("Query update finished: {:?}", outcome);
            HttpResponse::Ok().json(state.controller.view())
        }
        Err(e) => error_response(&e),
    }
}

/// Refetch the list under review
///
/// POST /api/v1/review/refresh
async fn refresh(state: web::Data<AppState>) -> impl Responder {
    match state.controller.refresh().await {
        Ok(_) => HttpResponse::Ok().json(state.controller.view()),
        Err(e) => error_response(&e),
    }
}

/// Approve a student for the job under review
///
/// POST /api/v1/review/approve
///
/// Request body:
/// ```json
/// { "studentId": "string" }
/// ```
async fn approve(
    state: web::Data<AppState>,
    req: web::Json<ApproveRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(&WorkflowError::from(errors));
    }

    match state.controller.approve(&req.student_id).await {
        Ok(outcome) => {
            let outcome = match outcome {
                ApprovalOutcome::Approved => "approved",
                ApprovalOutcome::AlreadyApproved => "already_approved",
            };
            HttpResponse::Ok().json(ApprovalResponse {
                success: true,
                outcome: outcome.to_string(),
            })
        }
        Err(e) => {
            tracing::error!("Approval of {} failed: {}", req.student_id, e);
            error_response(&e)
        }
    }
}
