//! Access control list middleware for the GatePass server.
//! This middleware can be placed on any route or service.
//!
//! It reads the JWT claims that [`crate::middleware::JwtMiddlewareFactory`] stored in the request
//! extensions and checks them against the roles the route accepts. If the user holds at least one
//! of the listed roles, the request is allowed to continue. Otherwise, a 403 Forbidden response
//! will be returned.

use std::pin::Pin;
use std::rc::Rc;
use actix_web::dev::{forward_ready, Service, Transform};
use actix_web::{dev::ServiceRequest, dev::ServiceResponse, Error, HttpMessage};
use actix_web::error::{ErrorForbidden, ErrorInternalServerError};
use futures::future::{ok, Ready};
use futures::Future;
use gatepass_engine::db_types::Role;
use crate::auth::JwtClaims;

pub struct AclMiddlewareFactory {
    accepted_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(accepted_roles: &[Role]) -> Self {
        AclMiddlewareFactory { accepted_roles: accepted_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AclMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService {
            accepted_roles: self.accepted_roles.clone(),
            service: Rc::new(service),
        })
    }
}

pub struct AclMiddlewareService<S> {
    accepted_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
    where
        S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
        S::Future: 'static,
        B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let accepted_roles = self.accepted_roles.clone();
        Box::pin(async move {
            let jwt_claims = req.extensions().get::<JwtClaims>()
                .ok_or_else(|| {
                    log::warn!("No JWT claims found in request extensions");
                    ErrorInternalServerError("No JWT claims found in request extensions")
                })?.clone();
            if accepted_roles.iter().any(|role| jwt_claims.roles.contains(role)) {
                service.call(req).await
            } else {
                Err(ErrorForbidden("Insufficient permissions"))
            }
        })
    }
}
