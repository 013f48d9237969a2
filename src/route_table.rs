use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{AccessPolicy, Location, RouteDescriptor, ViewBinding};

#[derive(Debug, Error)]
pub enum RouteTableError {
    #[error("invalid route pattern `{path}`: {source}")]
    InvalidPattern {
        path: String,
        #[source]
        source: matchit::InsertError,
    },
}

/// storefront_routes
///
/// The storefront's route table, in declaration order.
///
/// `/products` and `/admin/products` intentionally render the same listing view under
/// different access policies.
pub fn storefront_routes() -> Vec<RouteDescriptor> {
    use AccessPolicy::*;

    vec![
        RouteDescriptor::new("/", ViewBinding::Home, Public),
        RouteDescriptor::new("/admin/products", ViewBinding::ProductList, RequiresAuth),
        RouteDescriptor::new("/categories", ViewBinding::CategoryList, Public),
        RouteDescriptor::new("/products", ViewBinding::ProductList, Public),
        RouteDescriptor::new("/cart", ViewBinding::CartList, RequiresAuth),
        RouteDescriptor::new("/products/create", ViewBinding::ProductCreateForm, RequiresAuth)
            .lazy(),
        RouteDescriptor::new("/products/edit/:id", ViewBinding::ProductEditForm, RequiresAuth)
            .lazy()
            .with_props(),
        RouteDescriptor::new("/login", ViewBinding::Login, RequiresGuest),
        RouteDescriptor::new("/register", ViewBinding::Register, RequiresGuest),
        RouteDescriptor::new("/dashboard", ViewBinding::Dashboard, RequiresAuth),
    ]
}

/// RouteTable
///
/// Immutable, ordered set of route descriptors compiled into a path matcher.
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
    matcher: matchit::Router<usize>,
}

impl RouteTable {
    /// Compiles the descriptors. Conflicting or malformed patterns are rejected.
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self, RouteTableError> {
        let mut matcher = matchit::Router::new();
        for (index, route) in routes.iter().enumerate() {
            matcher
                .insert(route.axum_path(), index)
                .map_err(|source| RouteTableError::InvalidPattern {
                    path: route.path.clone(),
                    source,
                })?;
        }
        Ok(Self { routes, matcher })
    }

    pub fn storefront() -> Result<Self, RouteTableError> {
        Self::new(storefront_routes())
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }

    /// locate
    ///
    /// Resolves a requested full path (which may carry a query string or hash) into a
    /// `Location`. One trailing slash is ignored. If nothing matches, the location has an
    /// empty `matched` list.
    pub fn locate(&self, full_path: &str) -> Location {
        let full_path = if full_path.is_empty() { "/" } else { full_path };
        let path = split_path(full_path);
        let lookup = normalize(path);

        let mut params = BTreeMap::new();
        let mut matched = Vec::new();
        if let Ok(found) = self.matcher.at(lookup) {
            for (name, value) in found.params.iter() {
                params.insert(name.to_string(), value.to_string());
            }
            matched.push(self.routes[*found.value].clone());
        }

        Location {
            path: path.to_string(),
            full_path: full_path.to_string(),
            params,
            matched,
        }
    }
}

/// Strips the query string and hash.
fn split_path(full_path: &str) -> &str {
    let end = full_path.find(['?', '#']).unwrap_or(full_path.len());
    match &full_path[..end] {
        "" => "/",
        path => path,
    }
}

fn normalize(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some("") | None => path,
        Some(trimmed) => trimmed,
    }
}
