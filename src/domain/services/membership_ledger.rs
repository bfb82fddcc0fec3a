use crate::config::Config;
use crate::domain::models::membership::{grant_window, MembershipGrant, MembershipPlan, PurchaseReceipt};
use crate::domain::models::payment::{NewPaymentParams, Payment, PaymentMethod};
use crate::domain::ports::{MembershipRepository, UserRepository};
use crate::domain::services::catalog::CatalogService;
use crate::domain::services::notification_dispatcher::NotificationDispatcher;
use crate::domain::services::notification_templates::NotificationTemplates;
use crate::error::AppError;
use crate::infra::cache::data_cache::{keys, DataCache};
use crate::metrics;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Payment and membership activation as one atomic purchase.
pub struct MembershipLedger {
    memberships: Arc<dyn MembershipRepository>,
    users: Arc<dyn UserRepository>,
    catalog: Arc<CatalogService>,
    cache: Arc<DataCache>,
    dispatcher: Arc<NotificationDispatcher>,
    templates: Arc<NotificationTemplates>,
    currency: String,
    tx_timeout: Duration,
}

impl MembershipLedger {
    pub fn new(
        memberships: Arc<dyn MembershipRepository>,
        users: Arc<dyn UserRepository>,
        catalog: Arc<CatalogService>,
        cache: Arc<DataCache>,
        dispatcher: Arc<NotificationDispatcher>,
        templates: Arc<NotificationTemplates>,
        config: &Config,
    ) -> Self {
        Self {
            memberships,
            users,
            catalog,
            cache,
            dispatcher,
            templates,
            currency: config.payment_currency.clone(),
            tx_timeout: config.store_tx_timeout,
        }
    }

    /// Charges the plan price and grants `duration_days` calendar days from
    /// today. Store failures come back as retryable errors; the ledger never
    /// retries on its own.
    pub async fn purchase(&self, user_id: &str, plan_id: &str, method: &str) -> Result<PurchaseReceipt, AppError> {
        let result = self.record(user_id, plan_id, method).await;
        let (receipt, plan) = match result {
            Ok(done) => {
                metrics::record_purchase("completed");
                done
            }
            Err(e) => {
                metrics::record_purchase(e.metric_label());
                if e.is_retryable() {
                    error!(user_id = %user_id, plan_id = %plan_id, "Purchase failed in store: {}", e);
                }
                return Err(e);
            }
        };

        info!(
            user_id = %user_id,
            payment_id = %receipt.payment_id,
            grant_id = %receipt.grant_id,
            grant_end = %receipt.grant_end,
            "Membership purchased"
        );

        self.cache.invalidate(&[keys::user_membership(user_id), keys::user_payments(user_id)]).await;
        self.notify(user_id, &plan, &receipt).await;
        Ok(receipt)
    }

    async fn record(&self, user_id: &str, plan_id: &str, method: &str) -> Result<(PurchaseReceipt, MembershipPlan), AppError> {
        let method: PaymentMethod = method.parse()?;
        let plan = self.catalog.get_plan(plan_id).await?;

        let (start, end) = grant_window(Utc::now().date_naive(), plan.duration_days)?;
        let payment = Payment::completed(NewPaymentParams {
            user_id: user_id.to_string(),
            amount_cents: plan.price_cents,
            currency: self.currency.clone(),
            method,
            description: Some(format!("Membership: {}", plan.name)),
            reference_id: None,
        });
        let grant = MembershipGrant::new(user_id, &plan.id, Some(payment.id.clone()), start, end);

        tokio::time::timeout(self.tx_timeout, self.memberships.record_purchase(&payment, &grant))
            .await
            .map_err(|_| AppError::Persistence(format!("store transaction exceeded {}ms", self.tx_timeout.as_millis())))??;

        let receipt = PurchaseReceipt {
            payment_id: payment.id,
            grant_id: grant.id,
            plan_id: plan.id.clone(),
            grant_start: grant.start_date,
            grant_end: grant.end_date,
            amount_cents: payment.amount_cents,
            currency: payment.currency,
        };
        Ok((receipt, plan))
    }

    pub async fn list_grants(&self, user_id: &str) -> Result<Vec<MembershipGrant>, AppError> {
        self.memberships.list_grants(user_id).await
    }

    async fn notify(&self, user_id: &str, plan: &MembershipPlan, receipt: &PurchaseReceipt) {
        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            other => {
                warn!(user_id = %user_id, "Skipping membership notification, user lookup failed: {:?}", other.err());
                return;
            }
        };
        match self.templates.membership_activated(&user.email, &user.name, plan, receipt) {
            Ok(job) => {
                let _ = self.dispatcher.enqueue(job).await;
            }
            Err(e) => warn!(user_id = %user_id, "Membership notification not rendered: {}", e),
        }
    }
}
