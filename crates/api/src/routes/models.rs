//! Request payloads and query strings accepted by the HTTP routes.

use serde::Deserialize;
use unieats_database::{
    ApplicationStatus, CafeteriaStatus, OrderStatus, ProfileStatus, Role, TicketPriority,
    TicketStatus,
};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    /// Surface the caller is signing in to.
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CafeteriaSearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitApplicationRequest {
    pub business_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_item_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    /// Public id of the cafeteria.
    pub cafeteria_id: String,
    pub items: Vec<OrderLineRequest>,
    pub pickup_time: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct OrdersQuery {
    pub status: Option<OrderStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AdminOrdersQuery {
    pub status: Option<OrderStatus>,
    /// Public id of the cafeteria.
    pub cafeteria_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Option<TicketPriority>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct TicketsQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTicketRequest {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    /// Public id of the admin taking the ticket.
    pub assigned_to: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCafeteriaRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub opening_hours: Option<String>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: i64,
    pub is_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub is_available: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AvailabilityRequest {
    pub is_available: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateInventoryItemRequest {
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: f64,
    pub reorder_level: Option<f64>,
    pub cost_per_unit_cents: Option<i64>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateInventoryItemRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<f64>,
    pub reorder_level: Option<f64>,
    pub cost_per_unit_cents: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustInventoryRequest {
    /// Signed change applied to the stored quantity.
    pub delta: f64,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DashboardQuery {
    pub days: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UsersQuery {
    pub role: Option<Role>,
    pub status: Option<ProfileStatus>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserStatusRequest {
    pub status: ProfileStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct CafeteriaStatusQuery {
    pub status: Option<CafeteriaStatus>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCafeteriaStatusRequest {
    pub status: CafeteriaStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ApplicationsQuery {
    pub status: Option<ApplicationStatus>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewApplicationRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct AuditLogsQuery {
    pub entity_type: Option<String>,
    pub limit: Option<i64>,
}
