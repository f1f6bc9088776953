//! End-to-end scenarios: a simulated browser talks to handlers built from
//! `SessionDirectives` and `protect`, the way the demo apps do.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use continuum::prelude::*;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};

// =========================================================================
// A minimal browser: a cookie jar that honours Set-Cookie and clears.
// =========================================================================

#[derive(Default)]
struct Browser {
    jar: BTreeMap<String, String>,
}

impl Browser {
    fn receive(&mut self, response: &HeaderMap) {
        for line in response.get_all(SET_COOKIE) {
            let cookie = cookie::Cookie::parse(line.to_str().unwrap().to_owned()).unwrap();
            if cookie.max_age() == Some(time::Duration::ZERO) {
                self.jar.remove(cookie.name());
            } else {
                self.jar
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if !self.jar.is_empty() {
            let line = self
                .jar
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(COOKIE, HeaderValue::from_str(&line).unwrap());
        }
        headers
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.jar.get(name).map(String::as_str)
    }
}

fn selector(refresh: &str) -> &str {
    refresh.split(':').next().unwrap()
}

const SECRET: &str = "c05ll3lesrinf39t7mc5h6un6r0c69lgfno69dsak3vabeqamouq4328cuaekros401ajdpkh60rrtpd8";

fn short_sessions() -> SessionConfig {
    SessionConfig {
        session_max_age: Duration::from_secs(60),
        refresh_max_age: Duration::from_secs(60 * 60),
        ..SessionConfig::default()
    }
}

// =========================================================================
// One-off session over cookies
// =========================================================================

#[tokio::test]
async fn test_one_off_login_current_login_logout() {
    let builder = ContinuumBuilder::new(SECRET).unwrap();
    let sessions = builder.directives(builder.one_off(StringSerializer), builder.cookie_transport());
    let mut browser = Browser::default();

    // POST /api/do_login with body "alice"
    let mut response = HeaderMap::new();
    sessions
        .set_session("alice".to_string(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    assert!(browser.cookie("_sessiondata").is_some());

    // GET /api/current_login
    let session = sessions
        .require_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(session.data, "alice");

    // POST /api/do_logout
    let mut response = HeaderMap::new();
    sessions
        .invalidate_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    assert!(browser.cookie("_sessiondata").is_none());

    // GET /api/current_login again
    let err = sessions
        .require_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

// =========================================================================
// Refresh session over cookies
// =========================================================================

#[tokio::test]
async fn test_refresh_silent_renewal_past_session_expiry() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .clock(clock.clone())
        .session_config(short_sessions());
    let store = Arc::new(InMemoryRefreshTokenStore::<String>::new());
    let sessions = builder.directives(
        builder.refreshable(StringSerializer, store.clone()),
        builder.cookie_transport(),
    );
    let mut browser = Browser::default();

    let mut response = HeaderMap::new();
    sessions
        .set_session("alice".to_string(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    let first_refresh = browser.cookie("_refreshtoken").unwrap().to_owned();

    // Past the session token, well within the refresh token.
    clock.advance(Duration::from_secs(5 * 60));

    let mut response = HeaderMap::new();
    let session = sessions
        .require_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);

    assert_eq!(session.data, "alice");
    assert!(session.was_refreshed());
    let second_refresh = browser.cookie("_refreshtoken").unwrap();
    assert_ne!(selector(second_refresh), selector(&first_refresh));

    // The renewed session token now serves requests without the store.
    let mut response = HeaderMap::new();
    sessions
        .require_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    assert!(response.get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_refresh_stolen_token_replay_logs_everyone_out() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .clock(clock.clone())
        .session_config(short_sessions());
    let sessions = builder.directives(
        builder.refreshable(
            StringSerializer,
            Arc::new(InMemoryRefreshTokenStore::<String>::new()),
        ),
        builder.cookie_transport(),
    );
    let mut victim = Browser::default();

    let mut response = HeaderMap::new();
    sessions
        .set_session("alice".to_string(), &mut response)
        .await
        .unwrap();
    victim.receive(&response);

    // An attacker copies the cookies.
    let attacker = Browser {
        jar: victim.jar.clone(),
    };
    clock.advance(Duration::from_secs(5 * 60));

    // The victim refreshes first.
    let mut response = HeaderMap::new();
    sessions
        .require_session(&victim.headers(), &mut response)
        .await
        .unwrap();
    victim.receive(&response);

    // Later, the attacker replays the consumed refresh token.
    clock.advance(Duration::from_secs(15));
    let replay = sessions
        .require_session(&attacker.headers(), &mut HeaderMap::new())
        .await;
    assert!(replay.is_err());

    // The whole login is revoked: once the victim's session token expires
    // there is nothing left to renew from.
    clock.advance(Duration::from_secs(5 * 60));
    let err = sessions
        .require_session(&victim.headers(), &mut HeaderMap::new())
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_parallel_requests_keep_winner_logged_in() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .clock(clock.clone())
        .session_config(short_sessions());
    let sessions = builder.directives(
        builder.refreshable(
            StringSerializer,
            Arc::new(InMemoryRefreshTokenStore::<String>::new()),
        ),
        builder.cookie_transport(),
    );
    let mut browser = Browser::default();

    let mut response = HeaderMap::new();
    sessions
        .set_session("alice".to_string(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    clock.advance(Duration::from_secs(5 * 60));

    // Two requests leave the page at once with the same expired cookies.
    let jar = browser.headers();
    let (mut first, mut second) = (HeaderMap::new(), HeaderMap::new());
    let (a, b) = tokio::join!(
        sessions.require_session(&jar, &mut first),
        sessions.require_session(&jar, &mut second),
    );
    assert_eq!(u8::from(a.is_ok()) + u8::from(b.is_ok()), 1);
    let (winner, loser) = if a.is_ok() {
        (first, second)
    } else {
        (second, first)
    };
    assert!(loser.get(SET_COOKIE).is_none());

    // Whichever response lands last, the winner's cookies survive.
    browser.receive(&winner);
    browser.receive(&loser);
    let renewed = browser.cookie("_refreshtoken").unwrap().to_owned();

    clock.advance(Duration::from_secs(5 * 60));
    let mut response = HeaderMap::new();
    let session = sessions
        .require_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    assert_eq!(session.data, "alice");
    assert_ne!(browser.cookie("_refreshtoken").unwrap(), renewed);
}

#[tokio::test]
async fn test_refresh_logout_revokes_refresh_token() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .clock(clock.clone())
        .session_config(short_sessions());
    let store = Arc::new(InMemoryRefreshTokenStore::<String>::new());
    let sessions = builder.directives(
        builder.refreshable(StringSerializer, store.clone()),
        builder.cookie_transport(),
    );
    let mut browser = Browser::default();

    let mut response = HeaderMap::new();
    sessions
        .set_session("alice".to_string(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    let kept = browser.headers();

    let mut response = HeaderMap::new();
    sessions
        .invalidate_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);
    assert!(browser.jar.is_empty());
    assert!(store.is_empty().await);

    // Cookies kept from before logout stop working once the session
    // token expires.
    clock.advance(Duration::from_secs(5 * 60));
    assert!(sessions
        .require_session(&kept, &mut HeaderMap::new())
        .await
        .is_err());
}

// =========================================================================
// Step-up: refreshed sessions are kept out of login-only routes
// =========================================================================

#[tokio::test]
async fn test_require_login_session_rejects_refreshed_session() {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .clock(clock.clone())
        .session_config(short_sessions());
    let sessions = builder.directives(
        builder.refreshable(
            StringSerializer,
            Arc::new(InMemoryRefreshTokenStore::<String>::new()),
        ),
        builder.cookie_transport(),
    );
    let mut browser = Browser::default();

    let mut response = HeaderMap::new();
    sessions
        .set_session("admin".to_string(), &mut response)
        .await
        .unwrap();
    browser.receive(&response);

    // GET /admin_area straight after login.
    sessions
        .require_login_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap();

    clock.advance(Duration::from_secs(5 * 60));
    let mut response = HeaderMap::new();
    let err = sessions
        .require_login_session(&browser.headers(), &mut response)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

    // Ordinary routes still accept the renewed session.
    browser.receive(&response);
    sessions
        .require_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap();
}

// =========================================================================
// Header transport
// =========================================================================

#[tokio::test]
async fn test_header_transport_round_trip() {
    let builder = ContinuumBuilder::new(SECRET).unwrap();
    let sessions = builder.directives(
        builder.refreshable(
            IntegerSerializer,
            Arc::new(InMemoryRefreshTokenStore::<i64>::new()),
        ),
        builder.header_transport().unwrap(),
    );

    let mut response = HeaderMap::new();
    sessions.set_session(42, &mut response).await.unwrap();
    assert!(response.get("set-refresh-token").is_some());

    let mut request = HeaderMap::new();
    request.insert("authorization", response["set-authorization"].clone());
    request.insert("refresh-token", response["set-refresh-token"].clone());

    let session = sessions
        .require_session(&request, &mut HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(session.data, 42);

    let mut response = HeaderMap::new();
    sessions
        .invalidate_session(&request, &mut response)
        .await
        .unwrap();
    assert!(response.is_empty());
}

// =========================================================================
// Mutating the payload
// =========================================================================

#[tokio::test]
async fn test_touch_session_persists_payload_change() {
    let builder = ContinuumBuilder::new(SECRET).unwrap();
    let sessions = builder.directives(builder.one_off(MapSerializer), builder.cookie_transport());
    let mut browser = Browser::default();

    let mut response = HeaderMap::new();
    let data: HashMap<String, String> = [("value".to_string(), "alice".to_string())].into();
    sessions.set_session(data, &mut response).await.unwrap();
    browser.receive(&response);

    // GET /api/current_login marks the session as seen.
    let mut response = HeaderMap::new();
    let mut session = sessions
        .require_session(&browser.headers(), &mut response)
        .await
        .unwrap();
    session.data.insert("new".into(), "false".into());
    sessions.touch_session(&session, &mut response).unwrap();
    browser.receive(&response);

    let session = sessions
        .require_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(session.data["new"], "false");
    assert_eq!(session.data["value"], "alice");
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct User {
    name: String,
    level: u32,
}

#[tokio::test]
async fn test_encrypted_json_session_hides_payload() {
    let builder = ContinuumBuilder::new(SECRET)
        .unwrap()
        .session_config(SessionConfig {
            token_format: TokenFormat::Encrypted,
            ..SessionConfig::default()
        });
    let sessions = builder.directives(
        builder.one_off(JsonSerializer::<User>::new()),
        builder.cookie_transport(),
    );
    let mut browser = Browser::default();

    let user = User {
        name: "alice".into(),
        level: 3,
    };
    let mut response = HeaderMap::new();
    sessions.set_session(user.clone(), &mut response).await.unwrap();
    browser.receive(&response);

    let token = browser.cookie("_sessiondata").unwrap();
    assert_eq!(token.split('.').count(), 4);

    let session = sessions
        .require_session(&browser.headers(), &mut HeaderMap::new())
        .await
        .unwrap();
    assert_eq!(session.data, user);
}

// =========================================================================
// CSRF
// =========================================================================

fn request(method: Method, headers: HeaderMap) -> Request<()> {
    let mut request = Request::builder().method(method).body(()).unwrap();
    *request.headers_mut() = headers;
    request
}

async fn ok_handler(_req: Request<()>) -> Result<Response<&'static str>, ContinuumError> {
    Ok(Response::new("ok"))
}

#[tokio::test]
async fn test_csrf_protect_enforces_double_submit() {
    let builder = ContinuumBuilder::new(SECRET).unwrap();
    let guard = builder.csrf_guard().unwrap();
    let mut browser = Browser::default();

    // GET /site/index.html hands out a token.
    let response = protect(&guard, request(Method::GET, browser.headers()), ok_handler)
        .await
        .unwrap();
    browser.receive(response.headers());
    let token = browser.cookie("XSRF-TOKEN").unwrap().to_owned();

    // A cross-site form post: the browser sends the cookie, nobody sends
    // the header.
    let err = protect(&guard, request(Method::POST, browser.headers()), ok_handler)
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::FORBIDDEN);

    // The page's own script echoes the token.
    let mut headers = browser.headers();
    headers.insert("x-xsrf-token", HeaderValue::from_str(&token).unwrap());
    let response = protect(&guard, request(Method::POST, headers), ok_handler)
        .await
        .unwrap();
    assert_eq!(response.body(), &"ok");
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_csrf_login_rotates_token() {
    let builder = ContinuumBuilder::new(SECRET).unwrap();
    let guard = builder.csrf_guard().unwrap();
    let sessions = builder.directives(builder.one_off(StringSerializer), builder.cookie_transport());
    let mut browser = Browser::default();

    let response = protect(&guard, request(Method::GET, browser.headers()), ok_handler)
        .await
        .unwrap();
    browser.receive(response.headers());
    let before = browser.cookie("XSRF-TOKEN").unwrap().to_owned();

    // POST /api/do_login
    let mut headers = browser.headers();
    headers.insert("x-xsrf-token", HeaderValue::from_str(&before).unwrap());
    let (sessions_ref, guard_ref) = (&sessions, &guard);
    let response = protect(&guard, request(Method::POST, headers), move |_req| async move {
        let mut response = Response::new("ok");
        sessions_ref
            .set_session("alice".to_string(), response.headers_mut())
            .await?;
        guard_ref.reissue(response.headers_mut())?;
        Ok::<_, ContinuumError>(response)
    })
    .await
    .unwrap();
    browser.receive(response.headers());

    let after = browser.cookie("XSRF-TOKEN").unwrap();
    assert_ne!(after, before);
    assert!(browser.cookie("_sessiondata").is_some());

    // The pre-login token is no longer accepted.
    let mut headers = browser.headers();
    headers.insert("x-xsrf-token", HeaderValue::from_str(&before).unwrap());
    let err = protect(&guard, request(Method::POST, headers), ok_handler)
        .await
        .unwrap_err();
    assert!(matches!(err, ContinuumError::Csrf(CsrfError::TokenMismatch)));
}
