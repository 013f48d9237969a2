use std::sync::Arc;
use thiserror::Error;

use crate::{
    guard::NavigationGuard,
    models::{Location, NavigationOutcome, ScrollPosition},
    route_table::RouteTable,
};

/// Upper bound on guard redirects followed for a single push.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("navigation to `{requested}` exceeded {limit} redirects")]
    TooManyRedirects { requested: String, limit: usize },
}

/// Navigator
///
/// Client-side router state: the committed location and the scroll offset. Every push is
/// run through the guard, and redirects issued by the guard are evaluated as fresh
/// transitions from the same previous location.
pub struct Navigator {
    routes: Arc<RouteTable>,
    guard: NavigationGuard,
    current: Location,
    scroll: ScrollPosition,
}

impl Navigator {
    pub fn new(routes: Arc<RouteTable>, guard: NavigationGuard) -> Self {
        Self {
            routes,
            guard,
            current: Location::start(),
            scroll: ScrollPosition::TOP,
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    pub fn scroll(&self) -> ScrollPosition {
        self.scroll
    }

    /// Records the viewport offset reported by the view layer.
    pub fn scroll_to(&mut self, top: u32) {
        self.scroll = ScrollPosition { top };
    }

    /// push
    ///
    /// Navigates to `full_path`, following guard redirects until a target is allowed.
    /// On success the location is committed and scroll is reset to the top. On failure
    /// the current location and scroll are left as they were.
    pub fn push(&mut self, full_path: &str) -> Result<&Location, NavigationError> {
        let mut requested = full_path.to_string();

        for _ in 0..=MAX_REDIRECTS {
            let target = self.routes.locate(&requested);
            match self.guard.decide(&target, &self.current) {
                NavigationOutcome::Proceed => {
                    self.current = target;
                    self.scroll = ScrollPosition::TOP;
                    return Ok(&self.current);
                }
                NavigationOutcome::RedirectTo { path } => {
                    tracing::debug!(from = %requested, to = %path, "Following guard redirect");
                    requested = path;
                }
            }
        }

        tracing::warn!(requested = %full_path, limit = MAX_REDIRECTS, "Redirect chain aborted");
        Err(NavigationError::TooManyRedirects {
            requested: full_path.to_string(),
            limit: MAX_REDIRECTS,
        })
    }
}
