//! API v1 routes.
//!
//! Every protected route carries its own role list through
//! [`AuthzLayer`]; authentication and rate limiting wrap the whole
//! protected tree, authentication outermost.

use crate::handlers::{
    appointments, auth, billing, chat, encounters, icd10, lab_orders, medical_records, users,
};
use crate::middleware::{AuthLayer, AuthzLayer, RateLimitLayer, RateLimitPolicy};
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post, put, MethodRouter},
    Router,
};
use hms_common_core::Role::{self, Admin, Doctor, Patient, Receptionist, Technician};

const ADMIN: &[Role] = &[Admin];
const ANY: &[Role] = &Role::ALL;
const FRONT_DESK: &[Role] = &[Admin, Receptionist];
const CLINICIANS: &[Role] = &[Admin, Doctor];

/// Create the v1 API router.
pub fn router(state: AppState) -> Router<AppState> {
    public_routes(&state).merge(protected_routes(&state))
}

/// Attach a role list to one method route.
fn allow(roles: &'static [Role], route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(AuthzLayer::allow(roles))
}

fn public_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let limits = &state.config.rate_limit;
    if !limits.enabled {
        return routes;
    }
    // No account yet, so the key is the client address alone.
    let policy = RateLimitPolicy::new(limits.max_requests, limits.window()).by_ip();
    routes.layer(RateLimitLayer::new(policy).with_store(state.rate_limit_store.clone()))
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    let routes = Router::new()
        .merge(auth_routes())
        .nest("/users", user_routes())
        .nest("/appointments", appointment_routes())
        .nest("/encounters", encounter_routes())
        .nest("/medical-records", medical_record_routes())
        .nest("/lab-orders", lab_order_routes())
        .nest("/billing", billing_routes())
        .nest("/chat", chat_routes())
        .route("/icd10/search", allow(ANY, get(icd10::search)));

    let limits = &state.config.rate_limit;
    let routes = if limits.enabled {
        let policy = RateLimitPolicy::from(limits);
        routes.layer(RateLimitLayer::new(policy).with_store(state.rate_limit_store.clone()))
    } else {
        routes
    };

    routes.layer(AuthLayer::new(
        state.decoder.clone(),
        state.users.clone(),
        &state.config.auth.cookie_name,
    ))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", allow(ANY, post(auth::logout)))
        .route("/auth/me", allow(ANY, get(auth::me)))
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(ADMIN, get(users::list)).merge(allow(ADMIN, post(users::create))),
        )
        .route("/doctors", allow(ANY, get(users::doctors)))
        .route("/me", allow(ANY, put(users::update_me)))
        .route(
            "/:id",
            allow(ANY, get(users::get))
                .merge(allow(ADMIN, patch(users::admin_update)))
                .merge(allow(ADMIN, delete(users::delete))),
        )
}

fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(&[Admin, Doctor, Patient, Receptionist], get(appointments::list))
                .merge(allow(&[Patient, Receptionist, Admin], post(appointments::create))),
        )
        .route(
            "/:id",
            allow(&[Admin, Doctor, Patient, Receptionist], get(appointments::get))
                .merge(allow(&[Admin, Receptionist, Patient], put(appointments::reschedule)))
                .merge(allow(FRONT_DESK, delete(appointments::delete))),
        )
        .route(
            "/:id/status",
            allow(&[Admin, Doctor, Receptionist], patch(appointments::update_status)),
        )
}

fn encounter_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(&[Admin, Doctor, Patient, Receptionist], get(encounters::list))
                .merge(allow(CLINICIANS, post(encounters::create))),
        )
        .route(
            "/:id",
            allow(&[Admin, Doctor, Patient, Receptionist], get(encounters::get))
                .merge(allow(CLINICIANS, put(encounters::update)))
                .merge(allow(ADMIN, delete(encounters::delete))),
        )
        .route("/:id/close", allow(CLINICIANS, post(encounters::close)))
}

fn medical_record_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(&[Admin, Doctor, Patient], get(medical_records::list))
                .merge(allow(CLINICIANS, post(medical_records::create))),
        )
        .route(
            "/:id",
            allow(&[Admin, Doctor, Patient], get(medical_records::get))
                .merge(allow(CLINICIANS, put(medical_records::update)))
                .merge(allow(CLINICIANS, delete(medical_records::delete))),
        )
}

fn lab_order_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(&[Admin, Doctor, Patient, Technician], get(lab_orders::list))
                .merge(allow(CLINICIANS, post(lab_orders::create))),
        )
        .route(
            "/:id",
            allow(&[Admin, Doctor, Patient, Technician], get(lab_orders::get))
                .merge(allow(ADMIN, delete(lab_orders::delete))),
        )
        .route("/:id/claim", allow(&[Technician], post(lab_orders::claim)))
        .route(
            "/:id/status",
            allow(&[Technician, Doctor, Admin], patch(lab_orders::update_status)),
        )
        .route(
            "/:id/results",
            allow(&[Technician, Admin], post(lab_orders::submit_results)),
        )
}

fn billing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            allow(&[Admin, Receptionist, Patient], get(billing::list))
                .merge(allow(FRONT_DESK, post(billing::create))),
        )
        .route(
            "/:id",
            allow(&[Admin, Receptionist, Patient], get(billing::get))
                .merge(allow(ADMIN, delete(billing::delete))),
        )
        .route("/:id/payments", allow(FRONT_DESK, post(billing::record_payment)))
        .route("/:id/void", allow(ADMIN, post(billing::void)))
}

fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/messages", allow(ANY, post(chat::send)))
        .route("/conversations", allow(ANY, get(chat::conversations)))
        .route("/messages/:user_id", allow(ANY, get(chat::thread)))
        .route("/messages/:user_id/read", allow(ANY, post(chat::mark_read)))
}
