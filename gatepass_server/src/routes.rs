//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, etc.) should be expressed as futures or asynchronous functions. Async handlers get executed
//! concurrently by worker threads and thus don't block execution.
//!
//! The routes are mounted as follows (see [`crate::server::create_server_instance`]):
//! * Public, at the application root: ticket purchases and lookups, the Razorpay checkout pair,
//!   the OTP login pair, the vision helpers, and `/health`.
//! * `/admin/*`: the review queue, verification decisions and role management. JWT plus the
//!   `Admin` role.
//! * `/scan/*`: gate scanning and entry confirmation. JWT plus the `GateStaff` or `Admin` role.

use actix_web::{get, post, web, HttpResponse, Responder};
use gatepass_engine::{
    db_types::{EmailAddress, GateEntry, Role, TicketId},
    ticket_objects::PublicTicket,
    traits::{AuthManagement, TicketStore},
    AuthApi,
    TicketFlowApi,
    TicketStoreError,
};
use log::*;
use razorpay_tools::{OrderNotes, RazorpayApi, RazorpayConfig};

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        AdminVerifyRequest,
        ConfirmResponse,
        CreateOrderRequest,
        CreateOrderResponse,
        ImageRequest,
        JsonResponse,
        LoginResponse,
        OtpRequest,
        OtpVerifyRequest,
        RoleUpdateRequest,
        ScanRequest,
        ScanResponse,
        StatusFilter,
        TicketRequest,
        VerifyAction,
        VerifyPaymentRequest,
    },
    errors::ServerError,
    integrations::{IdentityProvider, VisionExtractor},
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:ty),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Tickets  ----------------------------------------------------

route!(create_ticket => Post "/tickets" impl TicketStore);
/// Route handler for manual ticket purchases.
///
/// The buyer has paid by UPI and uploaded a screenshot of the payment. The ticket is created in
/// the `PENDING` state and stays inadmissible until an admin verifies the proof. Returns a 201
/// with the public view of the new ticket.
pub async fn create_ticket<B: TicketStore>(
    body: web::Json<TicketRequest>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ticket = body.into_inner().validate()?;
    debug!("💻️ POST create ticket for a {} pass", ticket.ticket_type);
    let ticket = api.create_ticket(ticket).await.map_err(|e| {
        debug!("💻️ Could not create ticket. {e}");
        e
    })?;
    info!("💻️ Created ticket {} ({})", ticket.ticket_id, ticket.status);
    Ok(HttpResponse::Created().json(PublicTicket::from(ticket)))
}

route!(ticket_by_id => Get "/tickets/{ticket_id}" impl TicketStore);
/// Route handler for the public ticket lookup.
///
/// Anyone holding a ticket id can see the public projection of that ticket. A malformed id is
/// indistinguishable from a missing one; both return a 404.
pub async fn ticket_by_id<B: TicketStore>(
    path: web::Path<String>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let raw = path.into_inner();
    let ticket_id = raw.parse::<TicketId>().map_err(|e| {
        debug!("💻️ Could not parse ticket id. {e}");
        ServerError::NoRecordFound(format!("Ticket {raw} does not exist"))
    })?;
    debug!("💻️ GET ticket {ticket_id}");
    let ticket = api
        .ticket_by_id(&ticket_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Ticket {ticket_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(PublicTicket::from(ticket)))
}

route!(extract_utr => Post "/tickets/extract-utr" impl VisionExtractor);
/// Reads the UTR reference, amount and date off an uploaded payment screenshot.
///
/// The extraction is advisory. It pre-fills the purchase form and gives the admin something to
/// eyeball; it never verifies a payment.
pub async fn extract_utr<V: VisionExtractor>(
    body: web::Json<ImageRequest>,
    vision: web::Data<V>,
) -> Result<HttpResponse, ServerError> {
    let ImageRequest { image_b64, mime_type } = body.into_inner();
    debug!("💻️ POST extract UTR from a {mime_type} image");
    let extraction = vision.extract_utr(&image_b64, &mime_type).await.map_err(|e| {
        debug!("💻️ Could not extract a UTR. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(extraction))
}

route!(verify_student_id => Post "/students/verify-id" impl VisionExtractor);
/// Checks an uploaded student ID card for student-tier eligibility. Advisory, like
/// [`extract_utr`].
pub async fn verify_student_id<V: VisionExtractor>(
    body: web::Json<ImageRequest>,
    vision: web::Data<V>,
) -> Result<HttpResponse, ServerError> {
    let ImageRequest { image_b64, mime_type } = body.into_inner();
    debug!("💻️ POST verify student id from a {mime_type} image");
    let check = vision.verify_student_id(&image_b64, &mime_type).await.map_err(|e| {
        debug!("💻️ Could not check the student id. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(check))
}

//----------------------------------------------   Payments  ----------------------------------------------------

/// Route handler for opening a Razorpay checkout.
///
/// Creates a gateway order for the requested amount and returns the ids the frontend needs to
/// open the checkout widget. No ticket exists yet; that happens in [`verify_payment`] once the
/// payment signature checks out.
#[post("/payments/create-order")]
pub async fn create_order(
    body: web::Json<CreateOrderRequest>,
    api: web::Data<RazorpayApi>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    req.validate()?;
    debug!("💻️ POST create order for {} ({})", req.amount, req.ticket_type);
    let notes = OrderNotes::from(&req);
    let order = api.create_order(req.amount, notes).await.map_err(|e| {
        debug!("💻️ Could not create a gateway order. {e}");
        e
    })?;
    let response = CreateOrderResponse {
        order_id: order.id,
        amount: order.amount,
        currency: order.currency,
        key_id: api.key_id().to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

route!(verify_payment => Post "/payments/verify-payment" impl TicketStore);
/// Route handler for the Razorpay checkout callback.
///
/// The payment signature binds the order id to the payment id under our key secret. If it
/// verifies, the payment really happened and a ticket is issued directly in the `VERIFIED`
/// state. If it doesn't, the request is rejected with a 401 and nothing is stored.
pub async fn verify_payment<B: TicketStore>(
    body: web::Json<VerifyPaymentRequest>,
    api: web::Data<TicketFlowApi<B>>,
    config: web::Data<RazorpayConfig>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST verify payment for order {}", req.razorpay_order_id);
    req.signature().verify(config.key_secret.reveal()).map_err(|e| {
        warn!("💻️ Rejecting the payment callback for order {}. {e}", req.razorpay_order_id);
        ServerError::Unauthorized("Payment signature verification failed".to_string())
    })?;
    let ticket = req.into_ticket()?;
    let ticket = api.create_verified_ticket(ticket).await.map_err(|e| {
        debug!("💻️ Could not create ticket for a verified payment. {e}");
        e
    })?;
    info!("💻️ Issued ticket {} for a gateway payment", ticket.ticket_id);
    Ok(HttpResponse::Created().json(PublicTicket::from(ticket)))
}

//----------------------------------------------   Auth  ----------------------------------------------------

route!(request_otp => Post "/auth/request-otp" impl IdentityProvider);
/// Asks the identity service to email a login code to the given address.
///
/// This route is unauthenticated. It succeeds whether or not the email has any roles; a login
/// with no roles is valid, it just cannot reach anything protected.
pub async fn request_otp<I: IdentityProvider>(
    body: web::Json<OtpRequest>,
    identity: web::Data<I>,
) -> Result<HttpResponse, ServerError> {
    let email = body.into_inner().email;
    debug!("💻️ POST request OTP for {email}");
    identity.send_otp(&email).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("OTP sent")))
}

route!(verify_otp => Post "/auth/verify-otp" impl IdentityProvider, AuthManagement);
/// Route handler for the second half of a staff login.
///
/// The posted code is checked against the identity service. Only once it passes is the login
/// recorded and an access token issued, carrying whatever roles are on file for the email. The
/// token is valid for a relatively short period and will NOT refresh.
pub async fn verify_otp<I, B>(
    body: web::Json<OtpVerifyRequest>,
    identity: web::Data<I>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError>
where
    I: IdentityProvider,
    B: AuthManagement,
{
    let OtpVerifyRequest { email, otp } = body.into_inner();
    debug!("💻️ POST verify OTP for {email}");
    identity.verify_otp(&email, &otp).await.map_err(|e| {
        debug!("💻️ OTP check failed for {email}. {e}");
        e
    })?;
    let roles = api.record_login(&email).await?;
    let access_token = signer.issue_token(&email, roles.clone())?;
    info!("💻️ {email} logged in with roles {roles:?}");
    Ok(HttpResponse::Ok().json(LoginResponse { access_token, roles }))
}

//----------------------------------------------   Admin  ----------------------------------------------------

route!(admin_tickets => Get "/tickets" impl TicketStore where requires [Role::Admin]);
/// Route handler for the admin review queue.
///
/// Returns full ticket rows, contact details and payment proof included, newest first. Pass
/// `?status=PENDING` (or any other status) to filter.
pub async fn admin_tickets<B: TicketStore>(
    query: web::Query<StatusFilter>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET tickets with status filter {:?}", filter.status);
    let tickets = api.tickets_by_status(filter.status).await.map_err(|e| {
        debug!("💻️ Could not fetch tickets. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(tickets))
}

route!(admin_verify => Post "/verify" impl TicketStore where requires [Role::Admin]);
/// Route handler for an admin's ruling on a payment proof.
///
/// `VERIFY` moves a `PENDING` ticket to `VERIFIED`; `REJECT` moves it to `REJECTED`. Anything
/// else is an invalid transition and returns a 400 without touching the ticket. Rulings are
/// final: there is no path out of `REJECTED`, and a verified ticket cannot be re-reviewed.
pub async fn admin_verify<B: TicketStore>(
    body: web::Json<AdminVerifyRequest>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let AdminVerifyRequest { ticket_id, action } = body.into_inner();
    info!("💻️ POST {action:?} for ticket {ticket_id}");
    let ticket = match action {
        VerifyAction::Verify => api.verify_ticket(&ticket_id).await,
        VerifyAction::Reject => api.reject_ticket(&ticket_id).await,
    }
    .map_err(|e| {
        debug!("💻️ Could not apply the verification decision. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(ticket))
}

route!(update_roles => Post "/roles" impl AuthManagement where requires [Role::Admin]);
/// Grants and revokes roles for staff emails. Takes a list of updates; `apply` runs before
/// `revoke` for each entry.
pub async fn update_roles<B: AuthManagement>(
    api: web::Data<AuthApi<B>>,
    body: web::Json<Vec<RoleUpdateRequest>>,
) -> Result<HttpResponse, ServerError> {
    for acl_request in body.into_inner() {
        let email = acl_request.email.parse::<EmailAddress>().map_err(|e| {
            debug!("💻️ Could not parse email address. {e}");
            ServerError::InvalidRequestBody(e.to_string())
        })?;
        debug!("💻️ POST update roles for {email}");
        api.assign_roles(&email, &acl_request.apply).await?;
        api.remove_roles(&email, &acl_request.revoke).await?;
    }
    Ok(HttpResponse::Ok().finish())
}

//----------------------------------------------   Gate  ----------------------------------------------------

route!(scan_ticket => Post "/scan" impl TicketStore where requires [Role::GateStaff, Role::Admin]);
/// Route handler for scanning a ticket at the gate.
///
/// Scanning never mutates anything and always returns a 200 with a result code and an
/// operator-facing message. A malformed or unknown id is simply "Invalid Ticket"; whoever is
/// probing ids at the gate learns nothing from the difference.
pub async fn scan_ticket<B: TicketStore>(
    body: web::Json<ScanRequest>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let Ok(ticket_id) = req.ticket_id.parse::<TicketId>() else {
        debug!("💻️ Scanned id is malformed");
        return Ok(HttpResponse::Ok().json(ScanResponse::invalid()));
    };
    debug!("💻️ POST scan {ticket_id}");
    let decision = api.scan_ticket(&ticket_id).await.map_err(|e| {
        debug!("💻️ Could not scan ticket. {e}");
        e
    })?;
    Ok(HttpResponse::Ok().json(ScanResponse::from(decision)))
}

route!(confirm_entry => Post "/confirm" impl TicketStore where requires [Role::GateStaff, Role::Admin]);
/// Route handler for letting a ticket holder through the gate.
///
/// Exactly one confirm call succeeds per ticket, no matter how many kiosks race on it. Anything
/// that stops the redemption, a malformed id, an unknown ticket, or a ticket that is not
/// currently `VERIFIED`, comes back as the same 400 so that the gate console shows one message.
pub async fn confirm_entry<B: TicketStore>(
    claims: JwtClaims,
    body: web::Json<ScanRequest>,
    api: web::Data<TicketFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    let ticket_id = req.ticket_id.parse::<TicketId>().map_err(|e| {
        debug!("💻️ Confirm request with a malformed id. {e}");
        ServerError::PreconditionFailed("Ticket not valid for entry".to_string())
    })?;
    info!("💻️ POST confirm entry for {ticket_id} by {}", claims.sub);
    let entry = GateEntry::new(req.gate_id, req.device_id);
    let ticket = api.confirm_entry(&ticket_id, entry).await.map_err(|e| match e {
        TicketStoreError::InvalidTransition { .. } | TicketStoreError::TicketNotFound(_) => {
            debug!("💻️ Entry refused for {ticket_id}. {e}");
            ServerError::PreconditionFailed("Ticket not valid for entry".to_string())
        },
        other => ServerError::from(other),
    })?;
    let response = ConfirmResponse {
        success: true,
        message: "Entry Confirmed".to_string(),
        ticket: (&ticket).into(),
    };
    Ok(HttpResponse::Ok().json(response))
}
