//! Walks through every session flavour in-process: a scripted client sends
//! requests to handlers built on `SessionDirectives`, and everything that
//! happens is logged.
//!
//! ```text
//! RUST_LOG=debug cargo run -p walkthrough
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use continuum::codec::random_token;
use continuum::prelude::*;
use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request, Response};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// A cookie-keeping client.
#[derive(Default)]
struct Client {
    jar: BTreeMap<String, String>,
}

impl Client {
    fn receive(&mut self, response: &HeaderMap) {
        for line in response.get_all(SET_COOKIE) {
            let Some(cookie) = line
                .to_str()
                .ok()
                .and_then(|l| cookie::Cookie::parse(l.to_owned()).ok())
            else {
                continue;
            };
            if cookie.value().is_empty() {
                self.jar.remove(cookie.name());
            } else {
                self.jar
                    .insert(cookie.name().to_owned(), cookie.value().to_owned());
            }
        }
    }

    fn headers(&self) -> HeaderMap {
        let line = self
            .jar
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        let mut headers = HeaderMap::new();
        if line.is_empty() {
            return headers;
        }
        if let Ok(value) = HeaderValue::from_str(&line) {
            headers.insert(COOKIE, value);
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// Custom payload: "name,level"
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Badge {
    name: String,
    level: i32,
}

fn badge_from_str(s: &str) -> Result<Badge, String> {
    let (name, level) = s.split_once(',').ok_or("expected \"name,level\"")?;
    let level = level.parse().map_err(|e| format!("bad level: {e}"))?;
    Ok(Badge {
        name: name.to_owned(),
        level,
    })
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

async fn one_off_cookies(builder: &ContinuumBuilder) -> Result<(), ContinuumError> {
    let sessions = builder.directives(builder.one_off(StringSerializer), builder.cookie_transport());
    let mut client = Client::default();

    let mut response = HeaderMap::new();
    sessions.set_session("alice".into(), &mut response).await?;
    client.receive(&response);

    let session = sessions
        .require_session(&client.headers(), &mut HeaderMap::new())
        .await?;
    tracing::info!(user = %session.data, "current login");

    let mut response = HeaderMap::new();
    sessions
        .invalidate_session(&client.headers(), &mut response)
        .await?;
    client.receive(&response);

    if let Err(e) = sessions
        .require_session(&client.headers(), &mut HeaderMap::new())
        .await
    {
        tracing::info!(status = %e.status(), "after logout");
    }
    Ok(())
}

async fn one_off_headers(builder: &ContinuumBuilder) -> Result<(), ContinuumError> {
    let sessions = builder.directives(builder.one_off(StringSerializer), builder.header_transport()?);

    let mut response = HeaderMap::new();
    sessions.set_session("bob".into(), &mut response).await?;

    let mut request = HeaderMap::new();
    if let Some(token) = response.get("set-authorization") {
        request.insert("authorization", token.clone());
    }
    let session = sessions
        .require_session(&request, &mut HeaderMap::new())
        .await?;
    tracing::info!(user = %session.data, "current login via header");
    Ok(())
}

async fn refreshable(builder: &ContinuumBuilder, clock: &ManualClock) -> Result<(), ContinuumError> {
    let store = Arc::new(InMemoryRefreshTokenStore::<String>::new());
    let sessions = builder.directives(
        builder.refreshable(StringSerializer, store.clone()),
        builder.cookie_transport(),
    );
    let mut client = Client::default();

    let mut response = HeaderMap::new();
    sessions.set_session("carol".into(), &mut response).await?;
    client.receive(&response);

    clock.advance(SESSION_AGE + Duration::from_secs(1));

    let mut response = HeaderMap::new();
    let session = sessions
        .require_session(&client.headers(), &mut response)
        .await?;
    client.receive(&response);
    tracing::info!(
        user = %session.data,
        refreshed = session.was_refreshed(),
        records = store.len().await,
        "session token expired and was renewed"
    );

    let mut response = HeaderMap::new();
    let admin = sessions
        .require_login_session(&client.headers(), &mut response)
        .await;
    tracing::info!(allowed = admin.is_ok(), "admin area with a renewed session");

    // Spent and expired records stay until swept; a server runs this on an
    // interval.
    clock.advance(Duration::from_secs(31 * 24 * 60 * 60));
    let purged = sessions.strategy().purge_expired().await?;
    tracing::info!(purged, records = store.len().await, "expired refresh tokens purged");

    let mut response = HeaderMap::new();
    sessions
        .invalidate_session(&client.headers(), &mut response)
        .await?;
    tracing::info!(records = store.len().await, "logged out");
    Ok(())
}

async fn payload_kinds(builder: &ContinuumBuilder) -> Result<(), ContinuumError> {
    let mut response = HeaderMap::new();
    let numbers = builder.directives(builder.one_off(IntegerSerializer), builder.header_transport()?);
    numbers.set_session(1_234_567_890, &mut response).await?;
    tracing::info!(token = ?response.get("set-authorization"), "integer session");

    let maps = builder.directives(builder.one_off(MapSerializer), builder.cookie_transport());
    let mut client = Client::default();
    let mut response = HeaderMap::new();
    let data: HashMap<String, String> = [
        ("value".to_owned(), "dave".to_owned()),
        ("new".to_owned(), "true".to_owned()),
    ]
    .into();
    maps.set_session(data, &mut response).await?;
    client.receive(&response);

    let mut response = HeaderMap::new();
    let mut session = maps
        .require_session(&client.headers(), &mut response)
        .await?;
    session.data.insert("new".into(), "false".into());
    maps.touch_session(&session, &mut response)?;
    client.receive(&response);
    tracing::info!(session = ?session.data, "map session updated");

    let badges = builder.directives(
        builder.one_off(FnSerializer::new(
            |b: &Badge| format!("{},{}", b.name, b.level),
            badge_from_str,
        )),
        builder.cookie_transport(),
    );
    let mut client = Client::default();
    let mut response = HeaderMap::new();
    let badge = Badge {
        name: "erin".into(),
        level: 7,
    };
    badges.set_session(badge, &mut response).await?;
    client.receive(&response);
    let session = badges
        .require_session(&client.headers(), &mut HeaderMap::new())
        .await?;
    tracing::info!(name = %session.data.name, level = session.data.level, "custom session");
    Ok(())
}

async fn encrypted(secret: &str) -> Result<(), ContinuumError> {
    let builder = ContinuumBuilder::new(secret)?.session_config(SessionConfig {
        token_format: TokenFormat::Encrypted,
        ..SessionConfig::default()
    });
    let sessions = builder.directives(builder.one_off(StringSerializer), builder.header_transport()?);

    let mut response = HeaderMap::new();
    sessions.set_session("frank".into(), &mut response).await?;
    let segments = response
        .get("set-authorization")
        .and_then(|v| v.to_str().ok())
        .map(|t| t.split('.').count());
    tracing::info!(?segments, "encrypted session token issued");
    Ok(())
}

async fn csrf(builder: &ContinuumBuilder) -> Result<(), ContinuumError> {
    let guard = builder.csrf_guard()?;
    let mut client = Client::default();

    let page = request(Method::GET, HeaderMap::new());
    let response = protect(&guard, page, |_req| async { Ok(Response::new("page")) }).await?;
    client.receive(response.headers());

    let forged = request(Method::POST, client.headers());
    match protect(&guard, forged, |_req| async { Ok(Response::new("done")) }).await {
        Ok(_) => tracing::warn!("forged request accepted"),
        Err(e) => tracing::info!(status = %e.status(), "forged request refused"),
    }

    let mut headers = client.headers();
    if let Some(token) = client.jar.get("XSRF-TOKEN") {
        if let Ok(value) = HeaderValue::from_str(token) {
            headers.insert("x-xsrf-token", value);
        }
    }
    let response = protect(&guard, request(Method::POST, headers), |_req| async { Ok(Response::new("done")) }).await?;
    tracing::info!(body = *response.body(), "echoed token accepted");
    Ok(())
}

fn request(method: Method, headers: HeaderMap) -> Request<()> {
    let mut request = Request::new(());
    *request.method_mut() = method;
    *request.headers_mut() = headers;
    request
}

const SESSION_AGE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let secret = std::env::var("CONTINUUM_SECRET").unwrap_or_else(|_| random_token::<64>());
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let builder = match ContinuumBuilder::new(&secret) {
        Ok(builder) => builder.clock(clock.clone()).session_config(SessionConfig {
            session_max_age: SESSION_AGE,
            ..SessionConfig::default()
        }),
        Err(e) => {
            tracing::error!(error = %e, "unusable secret");
            return;
        }
    };

    let results = [
        ("one-off over cookies", one_off_cookies(&builder).await),
        ("one-off over headers", one_off_headers(&builder).await),
        ("refreshable", refreshable(&builder, &clock).await),
        ("payload kinds", payload_kinds(&builder).await),
        ("encrypted", encrypted(&secret).await),
        ("csrf", csrf(&builder).await),
    ];

    for (name, result) in results {
        match result {
            Ok(()) => tracing::info!(scenario = name, "ok"),
            Err(e) => tracing::error!(scenario = name, status = %e.status(), error = %e, "failed"),
        }
    }
}
