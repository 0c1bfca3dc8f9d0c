use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use placement_engine::config::{LogFormat, Settings};
use placement_engine::core::EligibilityClassifier;
use placement_engine::models::ErrorResponse;
use placement_engine::routes::{self, AppState};
use placement_engine::services::{MatchingApiClient, MatchingService};
use placement_engine::workflow::{ApprovalController, SessionContext};
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::EnvFilter;

/// JSON error for malformed request payloads
#[derive(Debug)]
struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for PayloadError {}

impl error::ResponseError for PayloadError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(&self.0)
    }
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

fn io_error(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, message)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::from_env().map_err(|e| io_error(format!("Configuration error: {}", e)))?;

    // LOG_LEVEL / LOG_FORMAT override the configured logging section
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| settings.logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| settings.logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .with_target(false)
        .with_level(true);

    match LogFormat::from_name(&log_format) {
        LogFormat::Pretty => subscriber.pretty().init(),
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    info!("Starting placement engine...");

    let client = MatchingApiClient::new(
        settings.matching_service.base_url.clone(),
        settings.matching_service.api_key.clone(),
        settings.matching_service.timeout(),
    )
    .map_err(|e| io_error(format!("Failed to create matching service client: {}", e)))?;
    let service: Arc<dyn MatchingService> = Arc::new(client);

    info!("Matching service client initialized ({})", settings.matching_service.base_url);

    let classifier = EligibilityClassifier::new(settings.eligibility.include_skill_gaps_when_ineligible);

    let session = SessionContext {
        admin_id: settings.session.admin_id.clone(),
        query: settings.session.query(),
    };

    let controller = ApprovalController::new(service, session, classifier).map_err(|e| {
        error!("Invalid review session: {}", e);
        io_error(e.to_string())
    })?;
    let controller = Arc::new(controller);

    // The service still starts when the first load fails; the view reports it
    if let Err(e) = controller.load().await {
        warn!("Initial match list load failed: {}", e);
    }

    let app_state = AppState {
        controller,
        classifier,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
