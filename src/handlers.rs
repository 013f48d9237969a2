use crate::{
    AppState,
    guard::DASHBOARD_PATH,
    models::{
        LoginCompletedRequest, LoginCompletedResponse, Location, NavigateRequest,
        NavigationOutcome, RenderedView, RouteDescriptor,
    },
    session,
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
};

// --- Page Handlers ---

/// render_view
///
/// [Page Route] Renders the view bound to the requested path. Only reached once the
/// navigation guard middleware has returned `Proceed`. Also serves as the page fallback,
/// answering 404 for paths no descriptor matches.
pub async fn render_view(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Json<RenderedView>, StatusCode> {
    let location = state.routes.locate(&full_path_of(&uri));
    RenderedView::for_location(&location)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Path plus query string of a request URI.
pub(crate) fn full_path_of(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

// --- API Handlers ---

/// get_routes
///
/// [API] Lists the route table in declaration order.
#[utoipa::path(
    get,
    path = "/api/routes",
    responses((status = 200, description = "Route table", body = [RouteDescriptor]))
)]
pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteDescriptor>> {
    Json(state.routes.routes().to_vec())
}

/// navigate
///
/// [API] Runs the navigation guard for a transition requested by the SPA and returns its
/// outcome. The guard's session side effects apply exactly as for page requests.
#[utoipa::path(
    post,
    path = "/api/navigate",
    request_body = NavigateRequest,
    responses((status = 200, description = "Guard outcome", body = NavigationOutcome))
)]
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> Json<NavigationOutcome> {
    let target = state.routes.locate(&payload.to);
    let previous = payload
        .from
        .as_deref()
        .map(|from| state.routes.locate(from))
        .unwrap_or_else(Location::start);

    Json(state.guard.decide(&target, &previous))
}

/// complete_login
///
/// [API] Login-completion handler. Persists the session issued by the authentication
/// service, then consumes the pending redirect stashed by the guard.
///
/// *Fallback*: resumes at the dashboard when no redirect was pending.
#[utoipa::path(
    post,
    path = "/api/session",
    request_body = LoginCompletedRequest,
    responses(
        (status = 200, description = "Session stored", body = LoginCompletedResponse),
        (status = 400, description = "Empty token"),
        (status = 503, description = "Session storage unavailable")
    )
)]
pub async fn complete_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCompletedRequest>,
) -> Result<Json<LoginCompletedResponse>, StatusCode> {
    if payload.token.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let store = state.guard.store().as_ref();
    session::store_session(store, &payload.token, payload.expires_at).map_err(|e| {
        tracing::error!(error = %e, "Failed to persist session");
        StatusCode::SERVICE_UNAVAILABLE
    })?;

    let redirect_to = session::take_pending_redirect(store)
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to read pending redirect");
            StatusCode::SERVICE_UNAVAILABLE
        })?
        .unwrap_or_else(|| DASHBOARD_PATH.to_string());

    Ok(Json(LoginCompletedResponse { redirect_to }))
}

/// logout
///
/// [API] Clears the session token and its expiry. The pending redirect is left alone.
#[utoipa::path(
    delete,
    path = "/api/session",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 503, description = "Session storage unavailable")
    )
)]
pub async fn logout(State(state): State<AppState>) -> StatusCode {
    match session::clear_session(state.guard.store().as_ref()) {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            tracing::error!(error = %e, "Failed to clear session");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
