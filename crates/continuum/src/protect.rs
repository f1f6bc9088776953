//! Wrapping a route with CSRF protection.

use std::future::Future;

use continuum_csrf::CsrfGuard;
use http::header::SET_COOKIE;
use http::{HeaderMap, Request, Response};

use crate::ContinuumError;

/// Runs `handler` only if `request` passes the CSRF check.
///
/// Safe requests always reach the handler; if they held no valid token, the
/// freshly minted one is added to the handler's response. Unsafe requests
/// without a matching token are refused with
/// [`CsrfError::TokenMismatch`](continuum_csrf::CsrfError::TokenMismatch)
/// (403) and the handler never runs.
///
/// ```rust,ignore
/// let response = protect(&guard, request, |req| async move {
///     let mut response = Response::new("ok");
///     directives.set_session(body, response.headers_mut()).await?;
///     guard.reissue(response.headers_mut())?;
///     Ok(response)
/// })
/// .await;
/// ```
pub async fn protect<B, R, F, Fut>(
    guard: &CsrfGuard,
    request: Request<B>,
    handler: F,
) -> Result<Response<R>, ContinuumError>
where
    F: FnOnce(Request<B>) -> Fut,
    Fut: Future<Output = Result<Response<R>, ContinuumError>>,
{
    let mut minted = HeaderMap::new();
    guard.check(request.method(), request.headers(), &mut minted)?;

    let mut response = handler(request).await?;
    for value in minted.get_all(SET_COOKIE) {
        response.headers_mut().append(SET_COOKIE, value.clone());
    }
    Ok(response)
}
