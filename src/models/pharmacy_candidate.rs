use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::LocatorError;
use crate::models::{Coordinate, PharmacyProfilesRow, SubscriptionsRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Rejected,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Rejected => "rejected",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "rejected" => Some(SubscriptionStatus::Rejected),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Subscription {
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Subscription {
    /// Active status alone is not enough: the end date must still lie ahead of `now`.
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && self.end_date > now
    }

    /// Rows with an unrecognised status yield `None`.
    pub fn from_row(row: &SubscriptionsRow) -> Option<Self> {
        Some(Subscription {
            status: SubscriptionStatus::parse(&row.status)?,
            start_date: row.start_date,
            end_date: row.end_date,
        })
    }
}

/// One pharmacy as seen by the resolver: profile data plus its subscription history.
#[derive(Debug, Clone)]
pub struct PharmacyCandidate {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub verified: bool,
    pub subscriptions: Vec<Subscription>,
}

impl PharmacyCandidate {
    pub fn from_row(row: PharmacyProfilesRow, subscriptions: Vec<Subscription>) -> Self {
        PharmacyCandidate {
            id: row.id,
            name: row.pharmacy_name,
            latitude: row.latitude,
            longitude: row.longitude,
            address: row.address.filter(|s| !s.trim().is_empty()),
            phone: row.phone.filter(|s| !s.trim().is_empty()),
            verified: row.is_verified,
            subscriptions,
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate, LocatorError> {
        Coordinate::from_parts(self.latitude, self.longitude)
    }

    pub fn has_active_subscription(&self, now: DateTime<Utc>) -> bool {
        self.subscriptions
            .iter()
            .any(|s| s.is_currently_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(status: SubscriptionStatus, end_offset_days: i64) -> Subscription {
        let now = Utc::now();
        Subscription {
            status,
            start_date: now - Duration::days(30),
            end_date: now + Duration::days(end_offset_days),
        }
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(
            SubscriptionStatus::parse(" Active "),
            Some(SubscriptionStatus::Active)
        );
        assert_eq!(
            SubscriptionStatus::parse("expired"),
            Some(SubscriptionStatus::Expired)
        );
        assert_eq!(SubscriptionStatus::parse("trial"), None);
        assert_eq!(SubscriptionStatus::Rejected.as_str(), "rejected");
    }

    #[test]
    fn active_requires_future_end_date() {
        let now = Utc::now();
        assert!(subscription(SubscriptionStatus::Active, 10).is_currently_active(now));
        assert!(!subscription(SubscriptionStatus::Active, -1).is_currently_active(now));
        assert!(!subscription(SubscriptionStatus::Pending, 10).is_currently_active(now));
    }

    #[test]
    fn end_date_equal_to_now_is_not_active() {
        let now = Utc::now();
        let sub = Subscription {
            status: SubscriptionStatus::Active,
            start_date: now - Duration::days(30),
            end_date: now,
        };
        assert!(!sub.is_currently_active(now));
    }

    #[test]
    fn any_active_subscription_counts() {
        let candidate = PharmacyCandidate {
            id: "p1".into(),
            name: "Pharmacie Centrale".into(),
            latitude: Some(36.75),
            longitude: Some(3.05),
            address: None,
            phone: None,
            verified: true,
            subscriptions: vec![
                subscription(SubscriptionStatus::Expired, -5),
                subscription(SubscriptionStatus::Active, 5),
            ],
        };
        assert!(candidate.has_active_subscription(Utc::now()));
    }

    #[test]
    fn unknown_status_rows_are_dropped() {
        let now = Utc::now();
        let row = SubscriptionsRow {
            id: "s1".into(),
            pharmacy_id: "p1".into(),
            status: "suspended".into(),
            start_date: now,
            end_date: now,
        };
        assert!(Subscription::from_row(&row).is_none());
    }
}
