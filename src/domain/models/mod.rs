pub mod booking;
pub mod class;
pub mod membership;
pub mod notification;
pub mod payment;
pub mod session;
pub mod trainer;
pub mod user;
