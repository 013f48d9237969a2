use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::{HeaderMap, HeaderName, Uri, header},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core navigation components.
pub mod clock;
pub mod config;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod route_table;
pub mod session;

// HTTP surface.
pub mod handlers;
pub mod routes;
use routes::{api, pages};

// --- Public Re-exports ---

pub use clock::{Clock, ClockState, FixedClock, SystemClock};
pub use config::AppConfig;
pub use guard::NavigationGuard;
pub use models::{AccessPolicy, Location, NavigationOutcome, RouteDescriptor, ViewBinding};
pub use navigation::{NavigationError, Navigator};
pub use route_table::RouteTable;
pub use session::{DisabledSessionStore, InMemorySessionStore, SessionStore, SessionStoreState};

/// ApiDoc
///
/// OpenAPI document for the JSON API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_routes, handlers::navigate, handlers::complete_login, handlers::logout
    ),
    components(
        schemas(
            models::AccessPolicy, models::ViewBinding, models::RouteDescriptor,
            models::NavigationOutcome, models::NavigateRequest, models::LoginCompletedRequest,
            models::LoginCompletedResponse, models::RenderedView, models::ScrollPosition,
        )
    ),
    tags(
        (name = "storefront-router", description = "Storefront navigation and access control")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every request: the compiled route table, the guard (which owns the session
/// store and clock) and the configuration.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub guard: NavigationGuard,
    pub config: AppConfig,
}

impl AppState {
    /// Builds the state from configuration with the storefront route table and a session
    /// store picked by `config.session_storage`.
    ///
    /// The store is process-wide: the server models a single browser session, so every
    /// client shares one login.
    pub fn from_config(
        config: AppConfig,
        clock: ClockState,
    ) -> Result<Self, route_table::RouteTableError> {
        let store: SessionStoreState = match config.session_storage {
            config::SessionStorage::Memory => Arc::new(InMemorySessionStore::new()),
            config::SessionStorage::Disabled => Arc::new(DisabledSessionStore),
        };

        Ok(Self {
            routes: Arc::new(RouteTable::storefront()?),
            guard: NavigationGuard::new(store, clock, config.diagnostics_enabled),
            config,
        })
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for NavigationGuard {
    fn from_ref(app_state: &AppState) -> NavigationGuard {
        app_state.guard.clone()
    }
}

/// navigation_guard
///
/// Middleware installed in front of every page route. Resolves the target from the request
/// URI and the previous location from the `Referer` header, then asks the guard.
///
/// `RedirectTo` answers with 307 and the base-prefixed path; `Proceed` lets the view render.
async fn navigation_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let target = state.routes.locate(&handlers::full_path_of(request.uri()));
    let previous = previous_location(&state, request.headers());

    match state.guard.decide(&target, &previous) {
        NavigationOutcome::Proceed => next.run(request).await,
        NavigationOutcome::RedirectTo { path } => {
            Redirect::temporary(&state.config.with_base(&path)).into_response()
        }
    }
}

/// The referring page, or the start location when there is none or it does not parse.
fn previous_location(state: &AppState, headers: &HeaderMap) -> Location {
    headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<Uri>().ok())
        .map(|uri| state.routes.locate(state.config.strip_base(uri.path())))
        .unwrap_or_else(Location::start)
}

/// create_router
///
/// Assembles the pages behind the navigation guard, the JSON API and the Swagger UI, then
/// applies the observability layers.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Guarded pages. `layer` rather than `route_layer` so the fallback is guarded too.
    let guarded_pages = pages::page_routes(&state.routes).layer(middleware::from_fn_with_state(
        state.clone(),
        navigation_guard,
    ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api::api_routes());

    // Pages live under the history base path. Axum refuses to nest at the root.
    let base_router = if state.config.base_url == "/" {
        base_router.merge(guarded_pages)
    } else {
        base_router.nest(&state.config.base_url, guarded_pages)
    };

    let base_router = base_router.with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
