use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gatepass_engine::{db_types::Role, sqlite::db::run_migrations, AuthApi, SqliteDatabase, TicketFlowApi};
use log::*;
use razorpay_tools::RazorpayApi;

use crate::{
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    integrations::{HttpIdentityProvider, HttpVisionExtractor},
    middleware::JwtMiddlewareFactory,
    routes::{
        create_order,
        health,
        AdminTicketsRoute,
        AdminVerifyRoute,
        ConfirmEntryRoute,
        CreateTicketRoute,
        ExtractUtrRoute,
        RequestOtpRoute,
        ScanTicketRoute,
        TicketByIdRoute,
        UpdateRolesRoute,
        VerifyOtpRoute,
        VerifyPaymentRoute,
        VerifyStudentIdRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    seed_initial_admin(&config, &db).await?;
    let srv = create_server_instance(config, db)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Grants the Admin role to the bootstrap email, if one is configured. A fresh database has no
/// admin accounts at all, so without this nobody could reach the verification queue.
async fn seed_initial_admin(config: &ServerConfig, db: &SqliteDatabase) -> Result<(), ServerError> {
    let Some(email) = &config.initial_admin_email else {
        return Ok(());
    };
    let auth_api = AuthApi::new(db.clone());
    auth_api.assign_roles(email, &[Role::Admin]).await?;
    info!("🔑️ {email} holds the Admin role.");
    Ok(())
}

pub fn create_server_instance(config: ServerConfig, db: SqliteDatabase) -> Result<Server, ServerError> {
    // The HTTP clients hold connection pools, so build them once and hand clones to the workers.
    let razorpay_api =
        RazorpayApi::new(config.razorpay.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let identity_api = HttpIdentityProvider::new(config.identity.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let vision_api =
        HttpVisionExtractor::new(config.vision.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let srv = HttpServer::new(move || {
        let tickets_api = TicketFlowApi::new(db.clone());
        let auth_api = AuthApi::new(db.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("gps::access_log"))
            .app_data(web::Data::new(tickets_api))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(jwt_signer))
            .app_data(web::Data::new(razorpay_api.clone()))
            .app_data(web::Data::new(config.razorpay.clone()))
            .app_data(web::Data::new(identity_api.clone()))
            .app_data(web::Data::new(vision_api.clone()));
        // Verification queue and role management. Requires a JWT carrying the Admin role.
        let admin_scope = web::scope("/admin")
            .wrap(JwtMiddlewareFactory::new(&config.auth))
            .service(AdminTicketsRoute::<SqliteDatabase>::new())
            .service(AdminVerifyRoute::<SqliteDatabase>::new())
            .service(UpdateRolesRoute::<SqliteDatabase>::new());
        // Gate consoles. Requires a JWT carrying the GateStaff or Admin role.
        let scan_scope = web::scope("/scan")
            .wrap(JwtMiddlewareFactory::new(&config.auth))
            .service(ScanTicketRoute::<SqliteDatabase>::new())
            .service(ConfirmEntryRoute::<SqliteDatabase>::new());
        app.service(health)
            .service(CreateTicketRoute::<SqliteDatabase>::new())
            .service(ExtractUtrRoute::<HttpVisionExtractor>::new())
            .service(TicketByIdRoute::<SqliteDatabase>::new())
            .service(VerifyStudentIdRoute::<HttpVisionExtractor>::new())
            .service(create_order)
            .service(VerifyPaymentRoute::<SqliteDatabase>::new())
            .service(RequestOtpRoute::<HttpIdentityProvider>::new())
            .service(VerifyOtpRoute::<HttpIdentityProvider, SqliteDatabase>::new())
            .service(admin_scope)
            .service(scan_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
