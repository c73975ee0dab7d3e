//! Row entities for every table in the schema

pub mod application;
pub mod audit;
pub mod cafeteria;
pub mod inventory;
pub mod notification;
pub mod order;
pub mod profile;
pub mod support;

pub use application::{ApplicationStatus, CafeteriaApplication, NewApplication};
pub use audit::{AuditLog, NewAuditLog};
pub use cafeteria::{
    Cafeteria, CafeteriaStatus, CafeteriaUpdate, MenuItem, MenuItemUpdate, NewCafeteria,
    NewMenuItem,
};
pub use inventory::{InventoryItem, InventoryUpdate, NewInventoryItem};
pub use notification::{NewNotification, Notification};
pub use order::{
    NewOrder, NewOrderLine, Order, OrderFilter, OrderItem, OrderStatus, RevenueSplit,
    SoldLine,
};
pub use profile::{NewProfile, Profile, ProfileFilter, ProfileStatus, Role};
pub use support::{
    ChatConversation, ChatMessage, NewTicket, SupportTicket, TicketFilter, TicketPriority,
    TicketStatus, TicketUpdate,
};
