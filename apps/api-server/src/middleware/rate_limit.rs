//! Rate limiting middleware.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use quill_core::ports::RateLimiter;
use quill_shared::ApiResponse;

const LIMITED_MESSAGE: &str = "Too many requests from this IP, please try again later.";

/// Rate limiting middleware factory. Without a limiter every request passes.
///
/// Clients are keyed by socket peer address. `Forwarded`/`X-Forwarded-For`
/// are only honoured after [`RateLimitMiddleware::trust_proxy`], since any
/// client can set them.
pub struct RateLimitMiddleware {
    limiter: Option<Arc<dyn RateLimiter>>,
    trust_proxy: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Option<Arc<dyn RateLimiter>>) -> Self {
        Self {
            limiter,
            trust_proxy: false,
        }
    }

    /// Key on the client address reported by a reverse proxy.
    pub fn trust_proxy(mut self, enabled: bool) -> Self {
        self.trust_proxy = enabled;
        self
    }
}

fn client_key(req: &ServiceRequest, trust_proxy: bool) -> String {
    if trust_proxy {
        let info = req.connection_info();
        if let Some(addr) = info.realip_remote_addr() {
            return addr.to_string();
        }
    }
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            trust_proxy: self.trust_proxy,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    limiter: Option<Arc<dyn RateLimiter>>,
    trust_proxy: bool,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let limiter = self.limiter.clone();
        let trust_proxy = self.trust_proxy;

        Box::pin(async move {
            if let Some(limiter) = limiter {
                let key = client_key(&req, trust_proxy);

                match limiter.check(&key).await {
                    Ok(result) if !result.allowed => {
                        tracing::warn!(client = %key, "Rate limit exceeded");

                        let response = HttpResponse::TooManyRequests()
                            .insert_header(("X-RateLimit-Limit", result.limit.to_string()))
                            .insert_header(("X-RateLimit-Remaining", "0"))
                            .insert_header(("Retry-After", result.retry_after_secs().to_string()))
                            .json(ApiResponse::failure(LIMITED_MESSAGE));

                        return Ok(req.into_response(response).map_into_right_body());
                    }
                    Ok(_) => {}
                    Err(e) => tracing::error!(error = %e, "Rate limiter error, failing open"),
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}
