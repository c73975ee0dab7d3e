//! HTTP surface of the UniEats backend: router, shared state, error mapping,
//! route handlers and the service layer behind them.

pub mod docs;
mod error;
mod middleware;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_document))
        // Auth routes
        .route("/api/auth/sign-up", post(routes::auth::sign_up))
        .route("/api/auth/sign-in", post(routes::auth::sign_in))
        .route("/api/auth/sign-out", post(routes::auth::sign_out))
        .route("/api/auth/me", get(routes::auth::me))
        .route(
            "/api/auth/change-password",
            post(routes::auth::change_password),
        )
        // Public browsing
        .route("/api/cafeterias", get(routes::cafeterias::list_cafeterias))
        .route(
            "/api/cafeterias/:cafeteria_id",
            get(routes::cafeterias::get_cafeteria),
        )
        .route(
            "/api/cafeterias/:cafeteria_id/menu",
            get(routes::cafeterias::get_menu),
        )
        .route(
            "/api/applications",
            post(routes::applications::submit_application),
        )
        // Student orders
        .route(
            "/api/orders",
            get(routes::orders::list_orders).post(routes::orders::place_order),
        )
        .route("/api/orders/:order_id", get(routes::orders::get_order))
        .route(
            "/api/orders/:order_id/cancel",
            post(routes::orders::cancel_order),
        )
        // Notifications
        .route(
            "/api/notifications",
            get(routes::notifications::get_notifications),
        )
        .route(
            "/api/notifications/unread-count",
            get(routes::notifications::get_unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(routes::notifications::mark_all_read),
        )
        .route(
            "/api/notifications/:notification_id/read",
            post(routes::notifications::mark_notification_read),
        )
        .route(
            "/api/notifications/:notification_id",
            delete(routes::notifications::delete_notification),
        )
        // Support tickets
        .route(
            "/api/support-tickets",
            get(routes::support::list_tickets).post(routes::support::create_ticket),
        )
        .route(
            "/api/support-tickets/:ticket_id",
            get(routes::support::get_ticket),
        )
        .route(
            "/api/support-tickets/:ticket_id/messages",
            post(routes::support::reply_to_ticket),
        )
        // Cafeteria owner back-office
        .route(
            "/api/cafeteria/profile",
            get(routes::owner::get_profile).put(routes::owner::update_profile),
        )
        .route(
            "/api/cafeteria/menu",
            get(routes::owner::list_menu).post(routes::owner::create_menu_item),
        )
        .route(
            "/api/cafeteria/menu/:item_id",
            put(routes::owner::update_menu_item).delete(routes::owner::delete_menu_item),
        )
        .route(
            "/api/cafeteria/menu/:item_id/availability",
            post(routes::owner::set_menu_availability),
        )
        .route("/api/cafeteria/orders", get(routes::owner::list_orders))
        .route(
            "/api/cafeteria/orders/:order_id/status",
            patch(routes::owner::update_order_status),
        )
        .route(
            "/api/cafeteria/inventory",
            get(routes::owner::list_inventory).post(routes::owner::create_inventory_item),
        )
        .route(
            "/api/cafeteria/inventory/low-stock",
            get(routes::owner::low_stock),
        )
        .route(
            "/api/cafeteria/inventory/:item_id",
            put(routes::owner::update_inventory_item).delete(routes::owner::delete_inventory_item),
        )
        .route(
            "/api/cafeteria/inventory/:item_id/adjust",
            post(routes::owner::adjust_inventory),
        )
        .route("/api/cafeteria/dashboard", get(routes::owner::dashboard))
        // Admin back-office
        .route("/api/admin/users", get(routes::admin::list_users))
        .route(
            "/api/admin/users/:user_id/status",
            patch(routes::admin::update_user_status),
        )
        .route("/api/admin/cafeterias", get(routes::admin::list_cafeterias))
        .route(
            "/api/admin/cafeterias/:cafeteria_id/status",
            patch(routes::admin::update_cafeteria_status),
        )
        .route(
            "/api/admin/applications",
            get(routes::admin::list_applications),
        )
        .route(
            "/api/admin/applications/:application_id/approve",
            post(routes::admin::approve_application),
        )
        .route(
            "/api/admin/applications/:application_id/reject",
            post(routes::admin::reject_application),
        )
        .route("/api/admin/orders", get(routes::admin::list_orders))
        .route("/api/admin/dashboard", get(routes::admin::dashboard))
        .route("/api/admin/audit-logs", get(routes::admin::list_audit_logs))
        .route(
            "/api/admin/support-tickets/:ticket_id",
            patch(routes::support::update_ticket),
        )
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .layer(cors_layer())
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(docs::ApiDoc::openapi())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}
