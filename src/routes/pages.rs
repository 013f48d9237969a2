use crate::{AppState, handlers, route_table::RouteTable};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// Mounts a `GET` route for every descriptor in the route table, all rendered by the same
/// view handler. The fallback answers unmatched paths, so those still go through the
/// guard's expiry check before the 404.
///
/// Access Control:
/// The caller wraps this router in the navigation guard middleware with `layer`, not
/// `route_layer`, so the fallback is guarded as well.
pub fn page_routes(routes: &RouteTable) -> Router<AppState> {
    routes
        .routes()
        .iter()
        .fold(Router::new(), |router, descriptor| {
            router.route(&descriptor.axum_path(), get(handlers::render_view))
        })
        .fallback(handlers::render_view)
}
