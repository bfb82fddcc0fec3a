pub mod admin;
pub mod auth;
pub mod booking;
pub mod class;
pub mod health;
pub mod membership;
pub mod payment;
pub mod trainer;
