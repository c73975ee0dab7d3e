pub mod admin;
pub mod applications;
pub mod auth;
pub mod cafeterias;
pub mod health;
pub mod models;
pub mod notifications;
pub mod orders;
pub mod owner;
pub mod support;
