//! JWT authentication middleware applied to every request.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use std::rc::Rc;

use crate::constants::{ERR_AUTH_REQUIRED, PUBLIC_PATHS};
use crate::errors::ApiError;
use crate::services::TokenService;

/// Whether `path` can be reached without an access token.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|prefix| path.starts_with(prefix))
}

/// JWT authentication middleware.
///
/// Requests to public paths pass through untouched. Every other request
/// needs a valid `Authorization: Bearer <token>` header; the decoded
/// claims are added to the request extensions. Rejections are rendered
/// here so outer middleware (CORS, logging) sees a normal response.
pub struct JwtAuth {
    tokens: TokenService,
}

impl JwtAuth {
    pub fn new(tokens: TokenService) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtAuthService {
            service: Rc::new(service),
            tokens: self.tokens.clone(),
        })
    }
}

pub struct JwtAuthService<S> {
    service: Rc<S>,
    tokens: TokenService,
}

impl<S, B> Service<ServiceRequest> for JwtAuthService<S>
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
        let service = Rc::clone(&self.service);
        let tokens = self.tokens.clone();

        Box::pin(async move {
            if is_public_path(req.path()) {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }

            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok());

            let verified = match auth_header {
                Some(header) => tokens.verify_header(Some(header)),
                None => {
                    debug!("Missing Authorization header for {}", req.path());
                    Err(ApiError::Unauthorized(ERR_AUTH_REQUIRED.to_string()))
                }
            };

            let claims = match verified {
                Ok(claims) => claims,
                Err(e) => return Ok(req.error_response(e).map_into_right_body()),
            };

            // Add claims to request extensions for use in handlers
            req.extensions_mut().insert(claims);

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}
