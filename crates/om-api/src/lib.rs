use std::env;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    extract::DefaultBodyLimit,
    extract::State,
    extract::connect_info::ConnectInfo,
    http::Method,
    http::Request,
    http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue},
    middleware,
    middleware::Next,
    response::Response,
    routing::get,
};
use clap::Parser;
use dotenvy::dotenv;
use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
};
use om_common::db::pool::DEFAULT_POOL_SIZE;
use om_common::db::{
    DEFAULT_FETCH_CAP, InMemoryProfileStore, PgProfileStore, ProfileStore, create_pool_from_url,
};
use om_common::logging::{LogSettings, init_tracing_subscriber, install_tracing_panic_hook};
use om_common::matching::{MatchEngine, MatchingConfig};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;

pub mod auth;
pub mod error;
pub mod handlers;

use auth::{API_KEY_HEADER, AuthConfig, AuthMode, JwtAlgorithm};
use error::ApiError;
use handlers::{health, matches};

const APP_NAME: &str = "om-api";
const SHUTDOWN_DRAIN_GRACE: Duration = Duration::from_millis(200);
const MAX_BODY_BYTES: usize = 64 * 1024;
const MAX_FETCH_CAP: usize = 1_000;

#[derive(Debug, Clone, Parser)]
#[command(name = "om-api", about = "HTTP API ranking O-1 talent against job postings")]
struct Cli {
    /// PostgreSQL connection string for the profile store
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 3002)]
    port: u16,

    /// API key for X-API-Key authentication
    #[arg(long, env = "OM_API_KEY")]
    api_key: Option<String>,

    /// Authentication mode: api_key | jwt
    #[arg(long, env = "AUTH_MODE", default_value = "api_key", value_enum)]
    auth_mode: AuthMode,

    /// HMAC secret for AUTH_MODE=jwt
    #[arg(long, env = "JWT_SECRET")]
    jwt_secret: Option<String>,

    /// PEM public key for AUTH_MODE=jwt with rs256/es256
    #[arg(long, env = "JWT_PUBLIC_KEY")]
    jwt_public_key: Option<String>,

    #[arg(long, env = "JWT_ALGORITHM", default_value = "hs512", value_enum)]
    jwt_algorithm: JwtAlgorithm,

    /// Comma separated list of allowed CORS origins
    #[arg(long, env = "OM_CORS_ORIGINS", default_value = "http://localhost:3000")]
    cors_origins: String,

    /// Most candidates loaded from the store per ranking request
    #[arg(long, env = "OM_MATCH_FETCH_CAP", default_value_t = DEFAULT_FETCH_CAP)]
    fetch_cap: usize,

    #[arg(long, env = "OM_DB_POOL_SIZE", default_value_t = DEFAULT_POOL_SIZE)]
    db_pool_size: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
    pub fetch_cap: usize,
    pub db_pool_size: usize,
}

impl AppConfig {
    fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        let cors_origins = cli
            .cors_origins
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect::<Vec<_>>();

        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::Config(
                "OM_CORS_ORIGINS must list explicit origins when credentials are enabled".into(),
            ));
        }

        let auth = AuthConfig {
            mode: cli.auth_mode,
            api_key: cli.api_key,
            jwt_secret: cli.jwt_secret,
            jwt_public_key: cli.jwt_public_key,
            jwt_algorithm: cli.jwt_algorithm,
        };
        auth.validate().map_err(ApiError::Config)?;

        if !(1..=MAX_FETCH_CAP).contains(&cli.fetch_cap) {
            return Err(ApiError::Config(format!(
                "OM_MATCH_FETCH_CAP must be between 1 and {MAX_FETCH_CAP}"
            )));
        }

        if cli.db_pool_size == 0 {
            return Err(ApiError::Config("OM_DB_POOL_SIZE must be positive".into()));
        }

        Ok(Self {
            database_url: cli.database_url,
            port: cli.port,
            cors_origins,
            auth,
            fetch_cap: cli.fetch_cap,
            db_pool_size: cli.db_pool_size,
        })
    }

    pub fn for_tests(auth: AuthConfig) -> Self {
        Self {
            database_url: "postgres://om:om@localhost:5432/o1".into(),
            port: 3002,
            cors_origins: vec!["http://localhost:3000".into()],
            auth,
            fetch_cap: DEFAULT_FETCH_CAP,
            db_pool_size: 2,
        }
    }
}

type IpRateLimiter = RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock, NoOpMiddleware>;

#[derive(Clone)]
pub struct RateLimits {
    global: Arc<IpRateLimiter>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: 20,
            burst: 40,
        }
    }
}

impl RateLimitConfig {
    fn parse_env<T: std::str::FromStr + PartialOrd + Default>(name: &str) -> Option<T> {
        env::var(name)
            .ok()
            .and_then(|value| value.trim().parse::<T>().ok())
            .filter(|value| *value > T::default())
    }

    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_sec: Self::parse_env("OM_RATE_LIMIT_PER_SEC").unwrap_or(defaults.per_sec),
            burst: Self::parse_env("OM_RATE_LIMIT_BURST").unwrap_or(defaults.burst),
        }
    }
}

fn build_ip_limiter(per_second: u64, burst_size: u32) -> Arc<IpRateLimiter> {
    let nanos_per_token = (1_000_000_000u64 / per_second.max(1)).max(1);
    let burst = NonZeroU32::new(burst_size).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(Duration::from_nanos(nanos_per_token))
        .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
        .allow_burst(burst);

    Arc::new(RateLimiter::keyed(quota))
}

pub fn rate_limits(config: &RateLimitConfig) -> RateLimits {
    RateLimits {
        global: build_ip_limiter(config.per_sec, config.burst),
    }
}

pub fn default_rate_limits() -> RateLimits {
    rate_limits(&RateLimitConfig::from_env())
}

pub struct AppState {
    pub store: Arc<dyn ProfileStore>,
    pub engine: Arc<MatchEngine>,
    pub config: AppConfig,
    pub(crate) rate_limits: RateLimits,
    pub readiness: Arc<AtomicBool>,
}

impl AppState {
    /// State with the default engine and env-derived rate limits.
    pub fn new(config: AppConfig, store: Arc<dyn ProfileStore>) -> Self {
        Self {
            store,
            engine: Arc::new(MatchEngine::default()),
            config,
            rate_limits: default_rate_limits(),
            readiness: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_engine(mut self, engine: MatchEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_rate_limits(mut self, rate_limits: RateLimits) -> Self {
        self.rate_limits = rate_limits;
        self
    }
}

pub type SharedState = Arc<AppState>;

impl axum::extract::FromRef<SharedState> for AuthConfig {
    fn from_ref(input: &SharedState) -> AuthConfig {
        input.config.auth.clone()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(API_KEY_HEADER),
        ])
        .allow_credentials(true)
}

fn request_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

fn enforce_rate_limit(limiter: &IpRateLimiter, ip: Option<IpAddr>) -> Result<(), ApiError> {
    if let Some(client_ip) = ip {
        if limiter.check_key(&client_ip).is_err() {
            return Err(ApiError::TooManyRequests("rate limit exceeded".into()));
        }
    }

    Ok(())
}

async fn global_rate_limit(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    enforce_rate_limit(&state.rate_limits.global, request_ip(&req))?;
    Ok(next.run(req).await)
}

async fn attach_request_id_context(req: Request<Body>, next: Next) -> Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    error::with_request_id(request_id, next.run(req)).await
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
        .route(
            "/matches/talents/:talent_id/jobs/:job_id",
            get(matches::get_match),
        )
        .route(
            "/matches/talents/:talent_id/jobs",
            get(matches::best_jobs_for_talent),
        )
        .route(
            "/matches/jobs/:job_id/talents",
            get(matches::best_talents_for_job),
        );

    Router::new()
        .route("/health", get(health::readyz))
        .route("/livez", get(health::livez))
        .route("/readyz", get(health::readyz))
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            global_rate_limit,
        ))
        .layer(middleware::from_fn(attach_request_id_context))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(trace)
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(SetRequestIdLayer::new(
            request_id_header,
            MakeRequestUuid,
        ))
        .layer(cors)
        .with_state(state)
}

/// API-key state over an empty in-memory store.
pub fn test_state(api_key: &str) -> SharedState {
    test_state_with_store(
        AuthConfig::api_key(api_key),
        Arc::new(InMemoryProfileStore::new()),
    )
}

pub fn test_state_with_store(auth: AuthConfig, store: Arc<dyn ProfileStore>) -> SharedState {
    Arc::new(AppState::new(AppConfig::for_tests(auth), store))
}

pub async fn run() -> Result<(), ApiError> {
    dotenv().ok();
    let log_settings = LogSettings::from_env();
    init_tracing_subscriber(APP_NAME, &log_settings);
    install_tracing_panic_hook(APP_NAME, &log_settings);

    let cli = Cli::parse();
    let config = AppConfig::from_cli(cli)?;
    let pool = create_pool_from_url(&config.database_url, config.db_pool_size)?;

    let engine = MatchEngine::new(MatchingConfig::from_env());
    let state = Arc::new(
        AppState::new(config.clone(), Arc::new(PgProfileStore::new(pool))).with_engine(engine),
    );

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    let app = create_router(state.clone());

    info!(
        %addr,
        auth_mode = ?config.auth.mode,
        fetch_cap = config.fetch_cap,
        engine_version = om_common::ENGINE_VERSION,
        "om-api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    info!("om-api stopped");
    Ok(())
}

async fn shutdown_signal(state: SharedState) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
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

    info!("shutdown requested; draining");
    state.readiness.store(false, Ordering::SeqCst);

    // Let load balancers observe /readyz as not ready before new connections
    // stop being accepted.
    tokio::time::sleep(SHUTDOWN_DRAIN_GRACE).await;
}
