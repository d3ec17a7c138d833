use sqlx::{sqlite::SqliteArguments, Arguments, SqlitePool};

use crate::models::{Coordinate, PharmacyProfilesRow};
use crate::services::distance_service::BoundingBox;

const SQL_LIST_VERIFIED_NEAR_BASE: &str = r#"
SELECT
    p.id, p.pharmacy_name, p.latitude, p.longitude, p.address, p.phone, p.is_verified
FROM pharmacy_profiles p
WHERE p.is_verified = 1
    AND p.latitude IS NOT NULL
    AND p.longitude IS NOT NULL
    AND p.latitude BETWEEN ? AND ?
"#;

// End dates are judged by the resolver; this only narrows the candidate set.
const SQL_HAS_ACTIVE_SUBSCRIPTION: &str = r#"
    AND EXISTS (
        SELECT 1 FROM subscriptions s
        WHERE s.pharmacy_id = p.id
            AND lower(trim(s.status)) = 'active'
    )
"#;

const SQL_ORDER_BY_PROXIMITY: &str = r#"
ORDER BY (p.latitude - ?) * (p.latitude - ?) + ? * (p.longitude - ?) * (p.longitude - ?) ASC, p.id
"#;

const SQL_LOAD_PHARMACY: &str = r#"
SELECT
    id, pharmacy_name, latitude, longitude, address, phone, is_verified
FROM pharmacy_profiles
WHERE id = ?1
"#;

/// Every verified pharmacy inside `bbox`, nearest first.
///
/// With `require_active_subscription` only pharmacies holding at least one
/// `active` subscription row are returned. There is no row cap: the resolver
/// must see every pharmacy the window could accept.
pub async fn list_verified_near(
    pool: &SqlitePool,
    center: Coordinate,
    bbox: BoundingBox,
    require_active_subscription: bool,
) -> sqlx::Result<Vec<PharmacyProfilesRow>> {
    let mut sql = String::from(SQL_LIST_VERIFIED_NEAR_BASE);
    let mut args = SqliteArguments::default();
    args.add(bbox.min_lat);
    args.add(bbox.max_lat);

    let lon_clauses = bbox
        .longitude_ranges()
        .into_iter()
        .map(|(min_lon, max_lon)| {
            args.add(min_lon);
            args.add(max_lon);
            "p.longitude BETWEEN ? AND ?"
        })
        .collect::<Vec<_>>();
    sql.push_str(&format!("    AND ({})\n", lon_clauses.join(" OR ")));

    if require_active_subscription {
        sql.push_str(SQL_HAS_ACTIVE_SUBSCRIPTION);
    }

    // A degree of longitude shrinks with cos(lat); scale it so the order follows km.
    let lon_scale = center.latitude().to_radians().cos().powi(2);
    sql.push_str(SQL_ORDER_BY_PROXIMITY);
    args.add(center.latitude());
    args.add(center.latitude());
    args.add(lon_scale);
    args.add(center.longitude());
    args.add(center.longitude());

    sqlx::query_as_with::<_, PharmacyProfilesRow, _>(&sql, args)
        .fetch_all(pool)
        .await
}

pub async fn load_pharmacy(
    pool: &SqlitePool,
    pharmacy_id: &str,
) -> sqlx::Result<Option<PharmacyProfilesRow>> {
    sqlx::query_as::<_, PharmacyProfilesRow>(SQL_LOAD_PHARMACY)
        .bind(pharmacy_id)
        .fetch_optional(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory_pool;
    use crate::services::distance_service::bounding_box;

    async fn seed(pool: &SqlitePool, id: &str, lat: f64, lon: f64, subscription: Option<&str>) {
        sqlx::query(
            "INSERT INTO pharmacy_profiles (id, pharmacy_name, latitude, longitude, is_verified) VALUES (?, ?, ?, ?, 1)",
        )
        .bind(id)
        .bind(format!("Pharmacie {}", id))
        .bind(lat)
        .bind(lon)
        .execute(pool)
        .await
        .unwrap();

        if let Some(status) = subscription {
            sqlx::query(
                "INSERT INTO subscriptions (id, pharmacy_id, status, start_date, end_date) \
                 VALUES (?, ?, ?, '2020-01-01T00:00:00+00:00', '2999-01-01T00:00:00+00:00')",
            )
            .bind(format!("sub-{}", id))
            .bind(id)
            .bind(status)
            .execute(pool)
            .await
            .unwrap();
        }
    }

    fn ids(rows: &[PharmacyProfilesRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn unsubscribed_crowd_does_not_hide_subscribed_pharmacy() {
        let pool = memory_pool().await;
        let center = Coordinate::new(36.7538, 3.0588).unwrap();
        for i in 0..500 {
            let offset = (i as f64) * 0.0001;
            seed(&pool, &format!("crowd-{}", i), 36.7538 + offset, 3.0588 + offset, None).await;
        }
        seed(&pool, "subscribed", 36.7538, 3.2, Some("active")).await;

        let bbox = bounding_box(center, 200.0);
        let rows = list_verified_near(&pool, center, bbox, true).await.unwrap();
        assert_eq!(ids(&rows), vec!["subscribed"]);

        let everyone = list_verified_near(&pool, center, bbox, false).await.unwrap();
        assert_eq!(everyone.len(), 501);
    }

    #[tokio::test]
    async fn only_active_subscription_rows_qualify() {
        let pool = memory_pool().await;
        let center = Coordinate::new(36.7538, 3.0588).unwrap();
        seed(&pool, "active", 36.76, 3.06, Some(" Active ")).await;
        seed(&pool, "expired", 36.76, 3.07, Some("expired")).await;
        seed(&pool, "pending", 36.76, 3.08, Some("pending")).await;

        let rows = list_verified_near(&pool, center, bounding_box(center, 200.0), true)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["active"]);
    }

    #[tokio::test]
    async fn nearest_first_in_kilometres() {
        let pool = memory_pool().await;
        let center = Coordinate::new(60.0, 10.0).unwrap();
        // 0.09 deg north is ~10 km; 0.1 deg east at 60N is ~5.6 km.
        seed(&pool, "north", 60.09, 10.0, None).await;
        seed(&pool, "east", 60.0, 10.1, None).await;

        let rows = list_verified_near(&pool, center, bounding_box(center, 200.0), false)
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["east", "north"]);
    }

    #[tokio::test]
    async fn pharmacies_across_the_antimeridian_are_loaded() {
        let pool = memory_pool().await;
        let center = Coordinate::new(-17.7, 179.9).unwrap();
        seed(&pool, "west-of-line", -17.7, -179.9, None).await;
        seed(&pool, "east-of-line", -17.7, 179.8, None).await;
        seed(&pool, "far", -17.7, -170.0, None).await;

        let rows = list_verified_near(&pool, center, bounding_box(center, 200.0), false)
            .await
            .unwrap();
        let mut found = ids(&rows);
        found.sort();
        assert_eq!(found, vec!["east-of-line", "west-of-line"]);
    }

    #[tokio::test]
    async fn unverified_and_unlocated_rows_are_skipped() {
        let pool = memory_pool().await;
        let center = Coordinate::new(36.7538, 3.0588).unwrap();
        sqlx::query(
            "INSERT INTO pharmacy_profiles (id, pharmacy_name, latitude, longitude, is_verified) VALUES \
             ('unverified', 'U', 36.76, 3.06, 0), ('nowhere', 'N', NULL, NULL, 1)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let rows = list_verified_near(&pool, center, bounding_box(center, 200.0), false)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
