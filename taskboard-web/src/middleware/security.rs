/// Security headers middleware
///
/// Adds security-related HTTP headers to every response. Pages are rendered
/// on the server with no scripts, so the content policy forbids scripts
/// outright and only allows inline styles.
///
/// # Headers Applied
///
/// - `X-Content-Type-Options: nosniff`
/// - `X-Frame-Options: DENY`
/// - `Referrer-Policy: same-origin`
/// - `Content-Security-Policy`
/// - `Cache-Control: no-store` (pages show per-user data)
/// - `Strict-Transport-Security` (production only)
///
/// # Example
///
/// ```no_run
/// use axum::Router;
/// use taskboard_web::middleware::security::SecurityHeadersLayer;
///
/// let app: Router = Router::new()
///     .layer(SecurityHeadersLayer::new(true)); // true = production mode
/// ```

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'none'; \
     style-src 'self' 'unsafe-inline'; img-src 'self' data:; form-action 'self'; \
     frame-ancestors 'none'";

const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Headers set on every response
const ALWAYS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "same-origin"),
    (header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY),
    (header::CACHE_CONTROL, "no-store"),
];

/// Layer adding the response headers listed above
#[derive(Debug, Clone)]
pub struct SecurityHeadersLayer {
    /// Send `Strict-Transport-Security`
    hsts: bool,
}

impl SecurityHeadersLayer {
    /// `hsts` should be true only behind HTTPS
    pub fn new(hsts: bool) -> Self {
        Self { hsts }
    }
}

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeaders<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeaders {
            inner,
            hsts: self.hsts,
        }
    }
}

/// Service produced by [`SecurityHeadersLayer`]
#[derive(Debug, Clone)]
pub struct SecurityHeaders<S> {
    inner: S,
    hsts: bool,
}

impl<S> Service<Request> for SecurityHeaders<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let future = self.inner.call(request);
        let hsts = self.hsts;

        Box::pin(async move {
            let mut response = future.await?;
            let headers = response.headers_mut();

            for (name, value) in ALWAYS {
                // Handlers may set a stricter value themselves
                headers
                    .entry(name)
                    .or_insert(HeaderValue::from_static(value));
            }

            if hsts {
                headers.insert(
                    header::STRICT_TRANSPORT_SECURITY,
                    HeaderValue::from_static(HSTS),
                );
            }

            Ok(response)
        })
    }
}
