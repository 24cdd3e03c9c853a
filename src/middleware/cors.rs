//! Permissive CORS headers for the monitoring front end

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{
    HeaderMap, HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use actix_web::http::Method;
use actix_web::{Error, HttpResponse};
use futures::future::{ready, LocalBoxFuture, Ready};

/// Adds CORS headers to every response and answers preflight requests
/// with 204 before they reach routing or authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsGate;

fn set_cors_headers(headers: &mut HeaderMap) {
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
}

impl<S, B> Transform<S, ServiceRequest> for CorsGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CorsGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CorsGateMiddleware { service }))
    }
}

pub struct CorsGateMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CorsGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if *req.method() == Method::OPTIONS {
            let mut preflight = HttpResponse::NoContent().finish();
            set_cors_headers(preflight.headers_mut());
            return Box::pin(ready(Ok(req.into_response(preflight).map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut response = fut.await?;
            set_cors_headers(response.headers_mut());
            Ok(response.map_into_left_body())
        })
    }
}
