//! Bearer-token middleware for the GatePass server.
//!
//! Wrap a scope with this middleware to require a valid access token on every route inside it.
//!
//! The middleware pulls the bearer token from the `Authorization` header, validates the signature
//! and expiry, and stores the [`JwtClaims`](crate::auth::JwtClaims) in the request extensions so
//! that handlers and the ACL middleware can read them. Requests without a valid token are rejected
//! before any handler runs.

use std::rc::Rc;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jsonwebtoken::DecodingKey;

use crate::{
    auth::{extract_bearer_token, validate_access_token},
    config::AuthConfig,
    errors::ServerError,
};

pub struct JwtMiddlewareFactory {
    decoding_key: DecodingKey,
}

impl JwtMiddlewareFactory {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        JwtMiddlewareFactory { decoding_key }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = JwtMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtMiddlewareService { decoding_key: self.decoding_key.clone(), service: Rc::new(service) }))
    }
}

pub struct JwtMiddlewareService<S> {
    decoding_key: DecodingKey,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let decoding_key = self.decoding_key.clone();
        Box::pin(async move {
            let token = extract_bearer_token(req.request())?;
            let claims = validate_access_token(&token, &decoding_key).map_err(ServerError::from)?;
            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}
