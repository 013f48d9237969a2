/// Router Module Index
///
/// Splits the HTTP surface into the guarded SPA pages and the JSON API consumed by the
/// SPA itself.

/// One page route per route descriptor, every one of them behind the navigation guard.
pub mod pages;

/// Unguarded JSON endpoints: route table, guard queries and the session lifecycle.
pub mod api;
