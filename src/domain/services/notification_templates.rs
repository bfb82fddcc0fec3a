use crate::domain::models::{
    booking::Reservation, class::ClassSession, membership::{MembershipPlan, PurchaseReceipt},
    notification::NotificationJob,
};
use crate::error::AppError;
use tera::{Context, Tera};
use tracing::error;

const BOOKING_CONFIRMATION: &str = "booking_confirmation.html";
const BOOKING_CANCELLATION: &str = "booking_cancellation.html";
const MEMBERSHIP_ACTIVATED: &str = "membership_activated.html";

/// Renders notification bodies from the bundled Tera templates.
pub struct NotificationTemplates {
    tera: Tera,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self, AppError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (BOOKING_CONFIRMATION, include_str!("../../templates/booking_confirmation.html")),
            (BOOKING_CANCELLATION, include_str!("../../templates/booking_cancellation.html")),
            (MEMBERSHIP_ACTIVATED, include_str!("../../templates/membership_activated.html")),
        ])
        .map_err(|e| AppError::InternalWithMsg(format!("Template load failed: {:?}", e)))?;
        Ok(Self { tera })
    }

    pub fn booking_confirmation(&self, recipient: &str, user_name: &str, class: &ClassSession, reservation: &Reservation) -> Result<NotificationJob, AppError> {
        let mut ctx = class_context(user_name, class, reservation);
        ctx.insert("duration_min", &class.duration_min);
        let body = self.render(BOOKING_CONFIRMATION, &ctx)?;
        let subject = format!("Booking confirmed: {} on {}", class.title, format_start(class));
        Ok(NotificationJob::new(recipient, subject, body))
    }

    pub fn booking_cancellation(&self, recipient: &str, user_name: &str, class: &ClassSession, reservation: &Reservation) -> Result<NotificationJob, AppError> {
        let ctx = class_context(user_name, class, reservation);
        let body = self.render(BOOKING_CANCELLATION, &ctx)?;
        Ok(NotificationJob::new(recipient, format!("Booking cancelled: {}", class.title), body))
    }

    pub fn membership_activated(&self, recipient: &str, user_name: &str, plan: &MembershipPlan, receipt: &PurchaseReceipt) -> Result<NotificationJob, AppError> {
        let mut ctx = Context::new();
        ctx.insert("user_name", user_name);
        ctx.insert("plan_name", &plan.name);
        ctx.insert("grant_start", &receipt.grant_start.to_string());
        ctx.insert("grant_end", &receipt.grant_end.to_string());
        ctx.insert("amount", &format_minor_units(receipt.amount_cents));
        ctx.insert("currency", &receipt.currency);
        ctx.insert("payment_id", &receipt.payment_id);
        let body = self.render(MEMBERSHIP_ACTIVATED, &ctx)?;
        Ok(NotificationJob::new(recipient, format!("Membership activated: {}", plan.name), body))
    }

    fn render(&self, name: &str, ctx: &Context) -> Result<String, AppError> {
        self.tera.render(name, ctx).map_err(|e| {
            error!("Tera render error for {}: {:?}", name, e);
            AppError::InternalWithMsg(format!("Tera render error: {:?}", e))
        })
    }
}

fn class_context(user_name: &str, class: &ClassSession, reservation: &Reservation) -> Context {
    let mut ctx = Context::new();
    ctx.insert("user_name", user_name);
    ctx.insert("class_title", &class.title);
    ctx.insert("start_time", &format_start(class));
    ctx.insert("reservation_id", &reservation.id);
    ctx
}

fn format_start(class: &ClassSession) -> String {
    class.start_time.format("%Y-%m-%d %H:%M").to_string()
}

/// 1500 -> "15.00"
fn format_minor_units(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::class::NewClassParams;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_confirmation_mentions_class_and_start() {
        let templates = NotificationTemplates::new().unwrap();
        let class = ClassSession::new(NewClassParams {
            title: "Yoga".into(),
            description: None,
            trainer_id: None,
            start_time: Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap(),
            duration_min: 60,
            capacity: 2,
        });
        let reservation = Reservation::new("u1", &class.id);

        let job = templates.booking_confirmation("a@gym.kz", "Aigerim", &class, &reservation).unwrap();
        assert_eq!(job.recipient, "a@gym.kz");
        assert!(job.subject.contains("Yoga"));
        assert!(job.subject.contains("2025-03-01 09:30"));
        assert!(job.body.contains(&reservation.id));
    }

    #[test]
    fn test_membership_amount_in_major_units() {
        let templates = NotificationTemplates::new().unwrap();
        let plan = MembershipPlan::new("Monthly".into(), 30, 1500);
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let receipt = PurchaseReceipt {
            payment_id: "p1".into(),
            grant_id: "g1".into(),
            plan_id: plan.id.clone(),
            grant_start: day,
            grant_end: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            amount_cents: 1500,
            currency: "KZT".into(),
        };

        let job = templates.membership_activated("a@gym.kz", "Aigerim", &plan, &receipt).unwrap();
        assert!(job.body.contains("15.00 KZT"));
        assert!(job.body.contains("2025-01-31"));
        assert_eq!(format_minor_units(5), "0.05");
    }
}
