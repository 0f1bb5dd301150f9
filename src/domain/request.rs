//! Pickup requests and their status lifecycle.
//!
//! A request is created once, at booking, with the quote frozen into it.
//! After that only the admin side moves the status; the transition table
//! here is the single definition of which moves are legal.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::entities::{CustomerContact, PickupSchedule};
use super::session::{QuoteSnapshot, ValuationSession};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    New,
    Hold,
    Suspect,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::New => "New",
            RequestStatus::Hold => "On Hold",
            RequestStatus::Suspect => "Suspect",
            RequestStatus::Rejected => "Rejected",
            RequestStatus::Completed => "Completed",
        }
    }

    /// Legal admin transitions. Reopening a held, suspect or rejected
    /// request moves it back to `New`; `Completed` is terminal.
    pub fn can_transition(&self, to: RequestStatus) -> bool {
        use RequestStatus::*;
        match self {
            New => matches!(to, Hold | Suspect | Rejected | Completed),
            Hold | Suspect => matches!(to, Completed | Rejected | New),
            Rejected => matches!(to, New),
            Completed => false,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatusError {
    #[error("illegal status transition: {from:?} -> {to:?}")]
    IllegalTransition {
        from: RequestStatus,
        to: RequestStatus,
    },
}

/// The persisted pickup-request document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupRequest {
    pub id: String,
    pub user_id: String,
    pub customer: CustomerContact,
    pub device: QuoteSnapshot,
    pub schedule: PickupSchedule,
    /// Quote frozen at booking time; never recomputed afterwards.
    pub final_price: f64,
    pub status: RequestStatus,
    #[serde(default)]
    pub status_reason: Option<String>,
    /// Unix seconds.
    pub created_at: u64,
    pub updated_at: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl PickupRequest {
    /// Book a pickup: consume the session, freeze its price and snapshot.
    /// The caller is expected to discard the session afterwards.
    pub fn book(
        session: &ValuationSession,
        customer: CustomerContact,
        schedule: PickupSchedule,
        user_id: impl Into<String>,
    ) -> Self {
        let now = unix_now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            customer,
            device: session.to_snapshot(),
            schedule,
            final_price: session.final_price(),
            status: RequestStatus::New,
            status_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Admin-side status move. Illegal moves leave the request untouched.
    pub fn transition(
        &mut self,
        to: RequestStatus,
        reason: Option<String>,
    ) -> Result<(), StatusError> {
        if !self.status.can_transition(to) {
            return Err(StatusError::IllegalTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.status_reason = reason;
        self.updated_at = unix_now();
        Ok(())
    }

    /// Customer-facing notification content for the current status.
    /// Delivery (Telegram, WhatsApp, email) is owned elsewhere; this is
    /// just the message payload.
    pub fn notification(&self) -> NotificationEvent {
        let device = format!("{} {}", self.device.brand_name, self.device.model_name);
        let body = match self.status {
            RequestStatus::New => format!(
                "Pickup booked for your {} on {} ({}). Quoted price: \u{20b9}{:.0}.",
                device, self.schedule.date, self.schedule.slot, self.final_price
            ),
            RequestStatus::Hold => format!(
                "Your pickup request for the {} is on hold. We will reach out shortly.",
                device
            ),
            RequestStatus::Suspect => format!(
                "Your pickup request for the {} needs additional verification.",
                device
            ),
            RequestStatus::Rejected => format!(
                "Your pickup request for the {} could not be accepted.",
                device
            ),
            RequestStatus::Completed => format!(
                "Pickup completed. \u{20b9}{:.0} will be paid out for your {}.",
                self.final_price, device
            ),
        };

        NotificationEvent {
            request_id: self.id.clone(),
            status: self.status,
            title: format!("Pickup request {}", self.status.label().to_lowercase()),
            body,
        }
    }
}

/// Message payload emitted on a status change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub request_id: String,
    pub status: RequestStatus,
    pub title: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::DeviceCategory;

    fn booked_request() -> PickupRequest {
        let mut session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);
        session.price_after_assessment = Some(45_000.0);
        PickupRequest::book(
            &session,
            CustomerContact {
                name: "Asha Rao".to_string(),
                phone: "+91 98765 43210".to_string(),
                email: None,
                address: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                pincode: "560001".to_string(),
            },
            PickupSchedule {
                date: "2024-03-18".to_string(),
                slot: "10 AM - 1 PM".to_string(),
            },
            "user-42",
        )
    }

    #[test]
    fn booking_freezes_the_final_price() {
        let request = booked_request();
        assert_eq!(request.final_price, 45_000.0);
        assert_eq!(request.status, RequestStatus::New);
        assert_eq!(request.device.price_after_assessment, Some(45_000.0));
        assert!(!request.id.is_empty());
    }

    #[test]
    fn legal_transitions_are_accepted() {
        let mut request = booked_request();
        assert!(request
            .transition(RequestStatus::Hold, Some("awaiting IMEI check".to_string()))
            .is_ok());
        assert!(request.transition(RequestStatus::New, None).is_ok());
        assert!(request.transition(RequestStatus::Suspect, None).is_ok());
        assert!(request.transition(RequestStatus::Completed, None).is_ok());
    }

    #[test]
    fn rejected_can_only_reopen() {
        let mut request = booked_request();
        request.transition(RequestStatus::Rejected, None).unwrap();
        assert_eq!(
            request.transition(RequestStatus::Completed, None),
            Err(StatusError::IllegalTransition {
                from: RequestStatus::Rejected,
                to: RequestStatus::Completed,
            })
        );
        assert!(request.transition(RequestStatus::New, None).is_ok());
    }

    #[test]
    fn completed_is_terminal() {
        let mut request = booked_request();
        request.transition(RequestStatus::Completed, None).unwrap();
        for to in [
            RequestStatus::New,
            RequestStatus::Hold,
            RequestStatus::Suspect,
            RequestStatus::Rejected,
        ] {
            assert!(request.transition(to, None).is_err());
            assert_eq!(request.status, RequestStatus::Completed);
        }
    }

    #[test]
    fn illegal_transition_preserves_reason() {
        let mut request = booked_request();
        request
            .transition(RequestStatus::Hold, Some("checking".to_string()))
            .unwrap();
        let result = request.transition(RequestStatus::Hold, Some("again".to_string()));
        assert!(result.is_err());
        assert_eq!(request.status_reason.as_deref(), Some("checking"));
    }

    #[test]
    fn completion_notification_carries_the_frozen_price() {
        let mut request = booked_request();
        request.transition(RequestStatus::Completed, None).unwrap();
        let event = request.notification();
        assert_eq!(event.status, RequestStatus::Completed);
        assert!(event.body.contains("45000"));
        assert!(event.body.contains("iPhone 13"));
    }
}
