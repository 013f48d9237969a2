use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Route Metadata Schemas ---

/// AccessPolicy
///
/// Governs whether a session token must be present, absent, or is irrelevant for a route
/// to be enterable. A route is never guest-only and auth-only at the same time, so the two
/// flags collapse into a single enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AccessPolicy {
    #[default]
    Public,
    RequiresAuth,
    RequiresGuest,
}

/// ViewBinding
///
/// Opaque reference to the view a route renders. The views themselves live in the SPA;
/// this crate only names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum ViewBinding {
    Home,
    // Shared by the public listing and the admin listing.
    ProductList,
    CategoryList,
    CartList,
    ProductCreateForm,
    ProductEditForm,
    Login,
    Register,
    Dashboard,
}

/// RouteDescriptor
///
/// Static binding of a path pattern to a view and an access policy. Built once at start-up
/// and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RouteDescriptor {
    /// Path pattern, either an exact path or parameterized (`/products/edit/:id`).
    pub path: String,
    pub view: ViewBinding,
    pub access_policy: AccessPolicy,
    /// The view bundle is loaded on first use.
    pub lazy: bool,
    /// Path parameters are passed to the view as props.
    pub props: bool,
}

impl RouteDescriptor {
    pub fn new(path: impl Into<String>, view: ViewBinding, access_policy: AccessPolicy) -> Self {
        Self {
            path: path.into(),
            view,
            access_policy,
            lazy: false,
            props: false,
        }
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    pub fn with_props(mut self) -> Self {
        self.props = true;
        self
    }

    /// axum_path
    ///
    /// Translates the `:name` segments of the pattern into the `{name}` capture syntax
    /// understood by `matchit` and `axum`.
    pub fn axum_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => format!("{{{}}}", name),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

// --- Navigation Schemas ---

/// Location
///
/// A navigation target resolved against the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Location {
    /// Path without query string or hash.
    pub path: String,
    /// Path including query string and hash, exactly as requested.
    pub full_path: String,
    pub params: BTreeMap<String, String>,
    /// Matched descriptors, outermost first. Empty when nothing matched.
    pub matched: Vec<RouteDescriptor>,
}

impl Location {
    /// The location a navigator sits at before its first transition.
    pub fn start() -> Self {
        Self {
            path: "/".to_string(),
            full_path: "/".to_string(),
            params: BTreeMap::new(),
            matched: Vec::new(),
        }
    }

    /// Returns true if any matched descriptor carries the given policy.
    pub fn requires(&self, policy: AccessPolicy) -> bool {
        self.matched
            .iter()
            .any(|record| record.access_policy == policy)
    }

    /// The innermost matched descriptor, which decides the rendered view.
    pub fn leaf(&self) -> Option<&RouteDescriptor> {
        self.matched.last()
    }
}

/// NavigationOutcome
///
/// The guard's verdict on a transition. The caller must not render the target unless the
/// outcome is `Proceed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export)]
pub enum NavigationOutcome {
    Proceed,
    RedirectTo { path: String },
}

impl NavigationOutcome {
    pub fn redirect(path: impl Into<String>) -> Self {
        NavigationOutcome::RedirectTo { path: path.into() }
    }

    pub fn is_proceed(&self) -> bool {
        matches!(self, NavigationOutcome::Proceed)
    }
}

/// ScrollPosition
///
/// Vertical viewport offset. Every committed transition resets it to the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ScrollPosition {
    pub top: u32,
}

impl ScrollPosition {
    pub const TOP: ScrollPosition = ScrollPosition { top: 0 };
}

/// RenderedView
///
/// Response body of a page route once the guard lets the transition through. The SPA
/// mounts `view` with `props` and applies `scroll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RenderedView {
    pub view: ViewBinding,
    pub path: String,
    pub full_path: String,
    pub lazy: bool,
    /// Path parameters, populated only for routes that pass them as props.
    pub props: BTreeMap<String, String>,
    pub scroll: ScrollPosition,
}

impl RenderedView {
    /// Builds the view for a location, or `None` when nothing matched.
    pub fn for_location(location: &Location) -> Option<Self> {
        let leaf = location.leaf()?;
        let props = if leaf.props {
            location.params.clone()
        } else {
            BTreeMap::new()
        };

        Some(Self {
            view: leaf.view,
            path: location.path.clone(),
            full_path: location.full_path.clone(),
            lazy: leaf.lazy,
            props,
            scroll: ScrollPosition::TOP,
        })
    }
}

// --- Request Payloads (Input Schemas) ---

/// NavigateRequest
///
/// Input payload for asking the guard about a transition (POST /api/navigate).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct NavigateRequest {
    pub to: String,
    /// Previous full path. Defaults to the start location.
    pub from: Option<String>,
}

/// LoginCompletedRequest
///
/// Input payload for the login-completion handler (POST /api/session). The token is
/// issued elsewhere; this only persists it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginCompletedRequest {
    pub token: String,
    /// Absolute expiry in epoch milliseconds.
    pub expires_at: Option<i64>,
}

// --- Response Schemas ---

/// LoginCompletedResponse
///
/// Where the SPA should continue after login: the stashed pending redirect, or the
/// dashboard when none was stashed.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginCompletedResponse {
    pub redirect_to: String,
}
