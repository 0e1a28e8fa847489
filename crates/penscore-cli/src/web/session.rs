//! Cookie sessions held in memory.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::debug;
use uuid::Uuid;

use penscore_core::User;

use super::AppState;

/// The logged-in user as remembered by the session map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
}

/// A session map entry.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: SessionUser,
    started: Instant,
}

impl Session {
    fn new(user: SessionUser) -> Self {
        Self {
            user,
            started: Instant::now(),
        }
    }

    fn expired(&self, ttl: Duration) -> bool {
        self.started.elapsed() >= ttl
    }
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
        }
    }
}

/// Extract the session id from a `Cookie` header value.
pub fn session_id(cookie_header: &str, cookie_name: &str) -> Option<Uuid> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn lookup(parts: &Parts, state: &AppState) -> Option<(Uuid, SessionUser)> {
    let cookie_name = &state.config.server.session_cookie;
    let id = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|header| session_id(header, cookie_name))?;

    let ttl = state.session_ttl();
    let session = state.sessions.get(&id).map(|s| s.clone())?;
    if session.expired(ttl) {
        state.sessions.remove(&id);
        return None;
    }
    Some((id, session.user))
}

impl AppState {
    fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.config.server.session_ttl_secs)
    }

    /// Drop sessions older than the configured lifetime.
    pub fn prune_sessions(&self) {
        let ttl = self.session_ttl();
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.expired(ttl));
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            debug!("Pruned {} expired sessions", pruned);
        }
    }

    /// Start a session and return the `Set-Cookie` value for it.
    pub fn login(&self, user: &User) -> String {
        self.prune_sessions();

        let id = Uuid::new_v4();
        self.sessions.insert(id, Session::new(SessionUser::from(user)));
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.config.server.session_cookie, id, self.config.server.session_ttl_secs
        )
    }

    /// Forget a session and return the `Set-Cookie` value clearing it.
    pub fn logout(&self, id: Option<Uuid>) -> String {
        if let Some(id) = id {
            self.sessions.remove(&id);
        }
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            self.config.server.session_cookie
        )
    }
}

/// Redirect carrying a `Set-Cookie` header.
pub fn redirect_with_cookie(to: &str, cookie: &str) -> Response {
    let mut response = Redirect::to(to).into_response();
    if let Ok(value) = HeaderValue::from_str(cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

/// Session user if one is logged in.
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(lookup(parts, state).map(|(_, user)| user)))
    }
}

/// Session id of the request, whether or not it is still known.
pub struct SessionId(pub Option<Uuid>);

impl FromRequestParts<AppState> for SessionId {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionId(lookup(parts, state).map(|(id, _)| id)))
    }
}

/// Logged-in user; anonymous requests are sent to the login page.
pub struct RequireUser(pub SessionUser);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        lookup(parts, state)
            .map(|(_, user)| RequireUser(user))
            .ok_or_else(|| Redirect::to("/login"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_from_cookie_header() {
        let id = Uuid::new_v4();
        let header = format!("theme=dark; penscore_session={id}; other=1");

        assert_eq!(session_id(&header, "penscore_session"), Some(id));
        assert_eq!(session_id(&header, "missing"), None);
        assert_eq!(session_id("penscore_session=not-a-uuid", "penscore_session"), None);
        assert_eq!(session_id("", "penscore_session"), None);
    }
}
