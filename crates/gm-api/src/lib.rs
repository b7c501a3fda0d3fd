use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::header::{CONTENT_TYPE, HeaderName, HeaderValue},
    http::Method,
    http::Request,
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use clap::Parser;
use dotenvy::dotenv;
use gm_common::{
    cache::{METRIC_CACHE_HITS, METRIC_CACHE_MISSES},
    catalog::{CandidateSource, InMemoryCatalog},
    config::AssemblyConfig,
    explanation::verify_templates,
    logging::{init_tracing_subscriber, install_tracing_panic_hook},
    matching::pipeline::{METRIC_CANDIDATES_FAILED, METRIC_CANDIDATES_SCORED},
    service::MatchingService,
    taxonomy::Taxonomy,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod error;
pub mod handlers;

use error::ApiError;
use handlers::{health, matches};

const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "gm-api", about = "HTTP API for program and partner recommendations")]
struct Cli {
    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3001)]
    port: u16,

    /// JSON catalog of programs and organizations served by the lookup endpoints
    #[arg(long, env = "GM_CATALOG_PATH")]
    catalog_path: Option<PathBuf>,

    /// JSON taxonomy replacing the built-in sector table
    #[arg(long, env = "GM_TAXONOMY_PATH")]
    taxonomy_path: Option<PathBuf>,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "GM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Upper bound (ms) for one scoring request
    #[arg(long, env = "GM_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Scoring worker threads (defaults to available cores)
    #[arg(long, env = "GM_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout: Duration,
    pub catalog_path: Option<PathBuf>,
    pub taxonomy_path: Option<PathBuf>,
    pub assembly: AssemblyConfig,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cli.request_timeout_ms == 0 {
            return Err(ApiError::BadRequest(
                "GM_REQUEST_TIMEOUT_MS must be positive".into(),
            ));
        }

        let mut assembly = AssemblyConfig::from_env();
        if let Some(threads) = cli.worker_threads.filter(|threads| *threads > 0) {
            assembly.worker_threads = Some(threads);
        }

        Ok(Self {
            port: cli.port,
            cors_origins,
            request_timeout: Duration::from_millis(cli.request_timeout_ms),
            catalog_path: cli.catalog_path,
            taxonomy_path: cli.taxonomy_path,
            assembly,
        })
    }

    pub fn for_tests() -> Self {
        Self {
            port: 3001,
            cors_origins: vec!["http://localhost:3000".into()],
            request_timeout: Duration::from_secs(5),
            catalog_path: None,
            taxonomy_path: None,
            assembly: AssemblyConfig {
                worker_threads: Some(2),
                ..AssemblyConfig::default()
            },
        }
    }
}

pub struct AppState {
    pub service: Arc<MatchingService>,
    pub config: AppConfig,
    pub readiness: Arc<AtomicBool>,
}

pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    Ok(error::with_request_id(request_id, next.run(req)).await)
}

pub fn create_router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let request_id_header = HeaderName::from_static("x-request-id");
    let trace_header = request_id_header.clone();

    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(&trace_header)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
            status = tracing::field::Empty,
        )
    });

    let api_routes = Router::new()
        .route("/match/programs", post(matches::score_programs))
        .route("/match/partners", post(matches::score_partners))
        .route(
            "/organizations/:id/programs",
            get(matches::organization_programs),
        )
        .route(
            "/organizations/:id/partners",
            get(matches::organization_partners),
        );

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid::default(),
        ))
        .layer(cors)
        .with_state(state)
}

const TEST_CATALOG: &str = r#"{
    "version": "fixture-1",
    "programs": [
        {
            "id": "p-ai-chip",
            "title": "AI 반도체 설계 고도화",
            "agency": "정보통신기획평가원",
            "sector": "ICT",
            "keywords": ["인공지능", "반도체"],
            "target_types": ["COMPANY"],
            "min_trl": 4,
            "max_trl": 7
        },
        {
            "id": "p-smart-farm",
            "title": "스마트팜 실증",
            "sector": "AGRI_FOOD",
            "keywords": ["스마트팜"],
            "min_trl": 6,
            "max_trl": 9
        },
        {
            "id": "p-closed",
            "title": "종료된 사업",
            "sector": "ICT",
            "status": "EXPIRED"
        }
    ],
    "organizations": [
        {
            "id": "org-chip",
            "name": "칩설계",
            "kind": "COMPANY",
            "industry_sector": "ICT",
            "current_trl": 5,
            "has_rd_experience": true,
            "key_technologies": ["인공지능", "반도체"],
            "employee_count": 40
        },
        {
            "id": "org-lab",
            "name": "지능형반도체연구원",
            "kind": "RESEARCH_INSTITUTE",
            "industry_sector": "ICT",
            "current_trl": 7,
            "has_rd_experience": true,
            "collaboration_count": 3,
            "key_technologies": ["반도체"]
        },
        {
            "id": "org-farm",
            "name": "그린농업",
            "industry_sector": "AGRI_FOOD",
            "current_trl": 3
        }
    ]
}"#;

/// Router state backed by a small fixture catalog and the built-in taxonomy.
pub fn test_state() -> SharedState {
    let catalog =
        InMemoryCatalog::from_json_str(TEST_CATALOG).expect("fixture catalog should parse");
    test_state_with(Arc::new(catalog), AppConfig::for_tests())
}

pub fn test_state_with(source: Arc<dyn CandidateSource>, config: AppConfig) -> SharedState {
    let service = MatchingService::new(
        source,
        Arc::new(Taxonomy::builtin()),
        config.assembly.clone(),
    )
    .expect("service should build");

    Arc::new(AppState {
        service: Arc::new(service),
        config,
        readiness: Arc::new(AtomicBool::new(true)),
    })
}

fn load_taxonomy(path: Option<&PathBuf>) -> Result<Taxonomy, ApiError> {
    let taxonomy = match path {
        Some(path) => Taxonomy::from_json_file(path)?,
        None => Taxonomy::builtin(),
    };
    info!(
        taxonomy_version = taxonomy.version(),
        sectors = taxonomy.sectors().len(),
        "taxonomy loaded"
    );
    Ok(taxonomy)
}

fn load_catalog(path: Option<&PathBuf>) -> Result<InMemoryCatalog, ApiError> {
    let catalog = match path {
        Some(path) => InMemoryCatalog::from_json_file(path)?,
        None => {
            warn!("GM_CATALOG_PATH not set; organization lookups will find nothing");
            InMemoryCatalog::default()
        }
    };
    info!(
        programs = catalog.program_count(),
        organizations = catalog.organization_count(),
        data_version = %catalog.data_version(),
        "catalog loaded"
    );
    Ok(catalog)
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    init_tracing_subscriber(env!("CARGO_PKG_NAME"));
    install_tracing_panic_hook(env!("CARGO_PKG_NAME"));

    gm_metrics::init_metrics("GM_METRICS_PORT", gm_metrics::DEFAULT_METRICS_PORT);
    gm_metrics::describe_counters(&[
        (METRIC_CANDIDATES_SCORED, "Candidates scored, by query kind"),
        (METRIC_CANDIDATES_FAILED, "Candidates skipped as malformed, by query kind"),
        (METRIC_CACHE_HITS, "Result cache hits, by query kind"),
        (METRIC_CACHE_MISSES, "Result cache misses, by query kind"),
    ]);

    verify_templates()?;

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let taxonomy = load_taxonomy(config.taxonomy_path.as_ref())?;
    let catalog = load_catalog(config.catalog_path.as_ref())?;

    let service = MatchingService::new(
        Arc::new(catalog),
        Arc::new(taxonomy),
        config.assembly.clone(),
    )?;

    let state = Arc::new(AppState {
        service: Arc::new(service),
        config: config.clone(),
        readiness: Arc::new(AtomicBool::new(true)),
    });

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(%addr, "gm-api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
            let _ = sigterm.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    state.readiness.store(false, Ordering::SeqCst);

    // Give load balancers a brief window to observe /readyz as not ready
    // before axum stops accepting new connections.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn sets_request_id_when_missing() {
        let app = create_router(test_state());

        let response = app
            .oneshot(Request::builder().uri("/livez").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[test]
    fn cli_overrides_worker_threads_and_rejects_zero_timeout() {
        let cli = Cli::parse_from(["gm-api", "--worker-threads", "3"]);
        let config = AppConfig::from_cli(cli).unwrap();
        assert_eq!(config.assembly.worker_threads, Some(3));
        assert_eq!(config.request_timeout, Duration::from_millis(5000));
        assert_eq!(config.cors_origins, vec!["http://localhost:3000".to_string()]);

        let cli = Cli::parse_from(["gm-api", "--request-timeout-ms", "0"]);
        assert!(matches!(
            AppConfig::from_cli(cli),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn fixture_catalog_parses() {
        let catalog = InMemoryCatalog::from_json_str(TEST_CATALOG).unwrap();
        assert_eq!(catalog.program_count(), 3);
        assert_eq!(catalog.organization_count(), 3);
    }
}
