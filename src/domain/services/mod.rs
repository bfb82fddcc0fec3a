pub mod auth_service;
pub mod catalog;
pub mod keyed_locks;
pub mod membership_ledger;
pub mod notification_dispatcher;
pub mod notification_templates;
pub mod reservation_engine;
pub mod session_store;
