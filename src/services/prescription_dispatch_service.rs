use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::database::notifications_repo::{self, NewNotification};
use crate::database::navigation_records_repo::{self, NewNavigationRecord};
use crate::database::{pharmacy_profiles_repo, prescriptions_repo};
use crate::error::LocatorError;
use crate::models::{Coordinate, PrescriptionsRow};
use crate::services::distance_service::haversine_km;
use crate::services::nearby_pharmacy_service::PharmacyLocator;

const NEW_PRESCRIPTION_KIND: &str = "new_prescription";
const NEW_PRESCRIPTION_TITLE: &str = "وصفة طبية جديدة";
const NEW_PRESCRIPTION_MESSAGE: &str = "وصلتك وصفة طبية جديدة من مريض قريب منك";

const CUSTOMER_NEARBY_KIND: &str = "customer_nearby";
const CUSTOMER_NEARBY_TITLE: &str = "مريض في الطريق";

const STATUS_DISPATCHED: &str = "dispatched";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub prescription_id: String,
    pub notified: usize,
    pub auto_expanded: bool,
    pub effective_max_distance_km: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalReport {
    pub pharmacy_id: String,
    pub distance_meters: u64,
}

/// Prescriptions are only visible to their owner; anything else reads as missing.
async fn load_owned_prescription(
    pool: &SqlitePool,
    user_id: &str,
    prescription_id: &str,
) -> Result<PrescriptionsRow, LocatorError> {
    prescriptions_repo::load_prescription(pool, prescription_id)
        .await?
        .filter(|p| p.user_id == user_id)
        .ok_or_else(|| LocatorError::NotFound(format!("prescription {}", prescription_id)))
}

/// Notifies every pharmacy the resolver returns for `requester` about a new prescription.
pub async fn dispatch_prescription(
    pool: &SqlitePool,
    locator: &PharmacyLocator,
    user_id: &str,
    prescription_id: &str,
    requester: Coordinate,
) -> Result<DispatchReport, LocatorError> {
    let prescription = load_owned_prescription(pool, user_id, prescription_id).await?;

    let nearby = locator
        .find_nearby(pool, requester, locator.settings.default_window())
        .await;

    // All notifications and the status change land together or not at all.
    let mut tx = pool.begin().await?;
    for pharmacy in &nearby.pharmacies {
        let id = Uuid::new_v4().to_string();
        let data = serde_json::json!({
            "prescription_id": prescription.id,
            "distance_km": pharmacy.distance_km,
        });
        notifications_repo::insert_notification(
            &mut *tx,
            NewNotification {
                id: &id,
                user_id: &pharmacy.id,
                title: NEW_PRESCRIPTION_TITLE,
                message: NEW_PRESCRIPTION_MESSAGE,
                kind: NEW_PRESCRIPTION_KIND,
                prescription_id: Some(&prescription.id),
                data: Some(data.to_string()),
            },
        )
        .await?;
    }

    if !nearby.pharmacies.is_empty() {
        prescriptions_repo::update_prescription_status(
            &mut *tx,
            &prescription.id,
            STATUS_DISPATCHED,
        )
        .await?;
    }
    tx.commit().await?;

    info!(
        "📨 Prescription {} sent to {} pharmacies (max {} km, auto_expanded={})",
        prescription.id,
        nearby.pharmacies.len(),
        nearby.effective_max_distance_km,
        nearby.auto_expanded
    );

    Ok(DispatchReport {
        prescription_id: prescription.id,
        notified: nearby.pharmacies.len(),
        auto_expanded: nearby.auto_expanded,
        effective_max_distance_km: nearby.effective_max_distance_km,
    })
}

/// Records that the patient is heading to `pharmacy_id` and tells the pharmacy how far away they are.
pub async fn notify_pharmacy_of_arrival(
    pool: &SqlitePool,
    user_id: &str,
    prescription_id: &str,
    pharmacy_id: &str,
    requester: Coordinate,
) -> Result<ArrivalReport, LocatorError> {
    let prescription = load_owned_prescription(pool, user_id, prescription_id).await?;

    let pharmacy = pharmacy_profiles_repo::load_pharmacy(pool, pharmacy_id)
        .await?
        .ok_or_else(|| LocatorError::NotFound(format!("pharmacy {}", pharmacy_id)))?;
    let pharmacy_coordinate = Coordinate::from_parts(pharmacy.latitude, pharmacy.longitude)?;

    // Straight line: the patient is close, a routed estimate adds nothing here.
    let distance_meters = (haversine_km(requester, pharmacy_coordinate) * 1000.0).round() as u64;

    let mut tx = pool.begin().await?;
    let record_id = Uuid::new_v4().to_string();
    navigation_records_repo::insert_navigation_record(
        &mut *tx,
        NewNavigationRecord {
            id: &record_id,
            user_id,
            pharmacy_id: &pharmacy.id,
            prescription_id: &prescription.id,
        },
    )
    .await?;

    let notification_id = Uuid::new_v4().to_string();
    let message = format!("مريض على بعد {} متر من صيدليتك", distance_meters);
    let data = serde_json::json!({
        "user_id": user_id,
        "prescription_id": prescription.id,
    });
    notifications_repo::insert_notification(
        &mut *tx,
        NewNotification {
            id: &notification_id,
            user_id: &pharmacy.id,
            title: CUSTOMER_NEARBY_TITLE,
            message: &message,
            kind: CUSTOMER_NEARBY_KIND,
            prescription_id: Some(&prescription.id),
            data: Some(data.to_string()),
        },
    )
    .await?;
    tx.commit().await?;

    info!(
        "📨 Pharmacy {} told a patient is {} m away",
        pharmacy.id, distance_meters
    );

    Ok(ArrivalReport {
        pharmacy_id: pharmacy.id,
        distance_meters,
    })
}
