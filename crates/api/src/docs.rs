use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(title = "UniEats API", description = "Campus food ordering backend"),
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::sign_up,
        crate::routes::auth::sign_in,
        crate::routes::auth::sign_out,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::cafeterias::list_cafeterias,
        crate::routes::cafeterias::get_cafeteria,
        crate::routes::cafeterias::get_menu,
        crate::routes::applications::submit_application,
        crate::routes::orders::place_order,
        crate::routes::orders::list_orders,
        crate::routes::orders::get_order,
        crate::routes::orders::cancel_order,
        crate::routes::notifications::get_notifications,
        crate::routes::notifications::get_unread_count,
        crate::routes::notifications::mark_notification_read,
        crate::routes::notifications::mark_all_read,
        crate::routes::notifications::delete_notification,
        crate::routes::support::create_ticket,
        crate::routes::support::list_tickets,
        crate::routes::support::get_ticket,
        crate::routes::support::reply_to_ticket,
        crate::routes::support::update_ticket,
        crate::routes::owner::get_profile,
        crate::routes::owner::update_profile,
        crate::routes::owner::list_menu,
        crate::routes::owner::create_menu_item,
        crate::routes::owner::update_menu_item,
        crate::routes::owner::delete_menu_item,
        crate::routes::owner::set_menu_availability,
        crate::routes::owner::list_orders,
        crate::routes::owner::update_order_status,
        crate::routes::owner::list_inventory,
        crate::routes::owner::create_inventory_item,
        crate::routes::owner::update_inventory_item,
        crate::routes::owner::delete_inventory_item,
        crate::routes::owner::adjust_inventory,
        crate::routes::owner::low_stock,
        crate::routes::owner::dashboard,
        crate::routes::admin::list_users,
        crate::routes::admin::update_user_status,
        crate::routes::admin::list_cafeterias,
        crate::routes::admin::update_cafeteria_status,
        crate::routes::admin::list_applications,
        crate::routes::admin::approve_application,
        crate::routes::admin::reject_application,
        crate::routes::admin::list_orders,
        crate::routes::admin::dashboard,
        crate::routes::admin::list_audit_logs
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::SessionResponse,
            crate::routes::auth::ProfileResponse,
            crate::routes::auth::SignOutResponse,
            crate::routes::cafeterias::CafeteriasResponse,
            crate::routes::cafeterias::CafeteriaResponse,
            crate::routes::applications::ApplicationResponse,
            crate::routes::orders::OrdersResponse,
            crate::routes::orders::OrderResponse,
            crate::routes::notifications::NotificationsResponse,
            crate::routes::notifications::MarkAllReadResponse,
            crate::routes::notifications::SuccessResponse,
            crate::routes::support::TicketsResponse,
            crate::routes::support::TicketResponse,
            crate::routes::support::MessageResponse,
            crate::routes::owner::MenuItemsResponse,
            crate::routes::owner::MenuItemResponse,
            crate::routes::owner::InventoryResponse,
            crate::routes::owner::InventoryItemResponse,
            crate::routes::admin::UsersResponse,
            crate::routes::admin::ApplicationsResponse,
            crate::routes::admin::AuditLogsResponse,
            crate::routes::models::SignUpRequest,
            crate::routes::models::SignInRequest,
            crate::routes::models::ChangePasswordRequest,
            crate::routes::models::SubmitApplicationRequest,
            crate::routes::models::OrderLineRequest,
            crate::routes::models::PlaceOrderRequest,
            crate::routes::models::UpdateOrderStatusRequest,
            crate::routes::models::CreateTicketRequest,
            crate::routes::models::ReplyRequest,
            crate::routes::models::UpdateTicketRequest,
            crate::routes::models::UpdateCafeteriaRequest,
            crate::routes::models::CreateMenuItemRequest,
            crate::routes::models::UpdateMenuItemRequest,
            crate::routes::models::AvailabilityRequest,
            crate::routes::models::CreateInventoryItemRequest,
            crate::routes::models::UpdateInventoryItemRequest,
            crate::routes::models::AdjustInventoryRequest,
            crate::routes::models::UpdateUserStatusRequest,
            crate::routes::models::UpdateCafeteriaStatusRequest,
            crate::routes::models::ReviewApplicationRequest,
            crate::services::orders::OrderDetail,
            crate::services::support::TicketThread,
            crate::services::cafeterias::CafeteriaMenu,
            crate::services::cafeterias::MenuCategory,
            crate::services::applications::ApprovedApplication,
            crate::services::notifications::UnreadCount,
            crate::services::metrics::MetricTotals,
            crate::services::metrics::StatusCount,
            crate::services::metrics::DailyMetrics,
            crate::services::metrics::CafeteriaMetrics,
            crate::services::metrics::TopItem,
            crate::services::metrics::OrderMetrics,
            crate::services::metrics::CafeteriaDashboard,
            crate::services::metrics::RoleCount,
            crate::services::metrics::AdminDashboard,
            unieats_database::Profile,
            unieats_database::Role,
            unieats_database::ProfileStatus,
            unieats_database::Cafeteria,
            unieats_database::CafeteriaStatus,
            unieats_database::MenuItem,
            unieats_database::Order,
            unieats_database::OrderItem,
            unieats_database::OrderStatus,
            unieats_database::InventoryItem,
            unieats_database::Notification,
            unieats_database::AuditLog,
            unieats_database::CafeteriaApplication,
            unieats_database::ApplicationStatus,
            unieats_database::SupportTicket,
            unieats_database::ChatMessage,
            unieats_database::TicketStatus,
            unieats_database::TicketPriority
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Role-scoped sign-in and sessions"),
        (name = "Cafeterias", description = "Public cafeteria browsing"),
        (name = "Applications", description = "Cafeteria onboarding requests"),
        (name = "Orders", description = "Student ordering"),
        (name = "Notifications", description = "In-app notifications"),
        (name = "Support", description = "Support tickets and their threads"),
        (name = "Cafeteria owner", description = "Owner back-office"),
        (name = "Admin", description = "Platform administration")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        let schemes = &mut components.security_schemes;

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("Bearer".to_string());
        }

        schemes.insert("bearerAuth".to_string(), scheme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_surface() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        for path in [
            "/health",
            "/api/auth/sign-in",
            "/api/orders",
            "/api/support-tickets/{ticket_id}",
            "/api/cafeteria/dashboard",
            "/api/admin/applications/{application_id}/approve",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearerAuth"));
    }
}
