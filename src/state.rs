use std::sync::Arc;
use governor::DefaultDirectRateLimiter;
use metrics_exporter_prometheus::PrometheusHandle;
use crate::config::Config;
use crate::domain::ports::{
    BookingRepository, ClassRepository, MembershipRepository, PaymentRepository, TrainerRepository,
    UserRepository,
};
use crate::domain::services::{
    auth_service::AuthService, catalog::CatalogService, membership_ledger::MembershipLedger,
    notification_dispatcher::NotificationDispatcher, reservation_engine::ReservationEngine,
    session_store::SessionStore,
};
use crate::infra::cache::data_cache::DataCache;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub user_repo: Arc<dyn UserRepository>,
    pub class_repo: Arc<dyn ClassRepository>,
    pub trainer_repo: Arc<dyn TrainerRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub membership_repo: Arc<dyn MembershipRepository>,
    pub payment_repo: Arc<dyn PaymentRepository>,
    pub cache: Arc<DataCache>,
    pub sessions: Arc<SessionStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub reservations: Arc<ReservationEngine>,
    pub ledger: Arc<MembershipLedger>,
    pub catalog: Arc<CatalogService>,
    pub auth_service: Arc<AuthService>,
    pub metrics_handle: Option<PrometheusHandle>,
    /// Global request budget; `None` when disabled.
    pub rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}
