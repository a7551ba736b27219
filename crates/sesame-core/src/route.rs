//! Logical routes and the route gate
//!
//! The RPC boundary asks the gate whether a logical route (login, callback,
//! ...) is enabled before it invokes the bridge. The enablement map is built
//! once at startup and never changes. Routes missing from the map are
//! disabled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::error::CoreError;

/// Logical route identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum RouteId {
    /// `GET /providers/{id}/login`
    LoginGet,
    /// `POST /providers/{id}/login`
    LoginPost,
    /// `GET /providers/{id}/login/callback`
    CallbackGet,
    /// User self-registration
    UserCreate,
}

impl RouteId {
    /// Every known route, in declaration order
    pub const ALL: [RouteId; 4] = [
        RouteId::LoginGet,
        RouteId::LoginPost,
        RouteId::CallbackGet,
        RouteId::UserCreate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteId::LoginGet => "login-get",
            RouteId::LoginPost => "login-post",
            RouteId::CallbackGet => "callback-get",
            RouteId::UserCreate => "user-create",
        }
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RouteId {
    type Err = CoreError;

    /// Accepts `login-get`, `login_get` and `ROUTE_LOGIN_GET`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        let normalized = normalized.strip_prefix("route-").unwrap_or(&normalized);

        RouteId::ALL
            .into_iter()
            .find(|route| route.as_str() == normalized)
            .ok_or_else(|| CoreError::UnknownRoute(s.to_string()))
    }
}

/// Static route enablement lookup
#[derive(Debug, Clone, Default)]
pub struct RouteGate {
    routes: HashMap<RouteId, bool>,
}

impl RouteGate {
    /// Create a gate from an enablement map
    pub fn new(routes: HashMap<RouteId, bool>) -> Self {
        Self { routes }
    }

    /// Gate that enables exactly the given routes
    pub fn allow(routes: impl IntoIterator<Item = RouteId>) -> Self {
        Self::new(routes.into_iter().map(|route| (route, true)).collect())
    }

    /// Whether a route is enabled. Unmapped routes are disabled.
    pub fn is_enabled(&self, route: RouteId) -> bool {
        self.routes.get(&route).copied().unwrap_or(false)
    }

    /// Enablement of every known route, mapped or not
    pub fn table(&self) -> BTreeMap<RouteId, bool> {
        RouteId::ALL
            .into_iter()
            .map(|route| (route, self.is_enabled(route)))
            .collect()
    }
}

impl FromIterator<(RouteId, bool)> for RouteGate {
    fn from_iter<T: IntoIterator<Item = (RouteId, bool)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
