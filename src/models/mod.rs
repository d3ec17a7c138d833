pub mod coordinate;
pub mod pharmacy_candidate;
pub mod pharmacy_profiles;
pub mod prescriptions;
pub mod subscriptions;

pub use coordinate::Coordinate;
pub use pharmacy_candidate::{PharmacyCandidate, Subscription, SubscriptionStatus};
pub use pharmacy_profiles::PharmacyProfilesRow;
pub use prescriptions::PrescriptionsRow;
pub use subscriptions::SubscriptionsRow;
