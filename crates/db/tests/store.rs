//! Integration tests for the PostgreSQL store.
//!
//! These need a PostgreSQL server reachable through `DATABASE_URL`; run them
//! with `cargo test -p weather-db -- --ignored`.

use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use weather_core::fingerprint::Fingerprint;
use weather_core::model::{Router, VersionNotifyType};
use weather_core::registry::{NewRouter, RegistryUpdate};
use weather_core::store::{StoreError, SubscriptionUpdate, WeatherStore};
use weather_core::types::Timestamp;
use weather_db::models::router::CreateRouter;
use weather_db::models::subscriber::CreateSubscriber;
use weather_db::models::subscription::{
    CreateBandwidthSub, CreateNodeDownSub, CreateTShirtSub, CreateVersionSub,
};
use weather_db::repositories::{
    BandwidthSubRepo, NodeDownSubRepo, RouterRepo, SubscriberRepo, TShirtSubRepo, VersionSubRepo,
};
use weather_db::PgWeatherStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn fp(c: char) -> Fingerprint {
    Fingerprint::parse(&c.to_string().repeat(40)).unwrap()
}

async fn seed_router(pool: &PgPool, c: char) -> Router {
    let row = RouterRepo::create(
        pool,
        &CreateRouter {
            fingerprint: fp(c),
            name: format!("relay{c}"),
            welcomed: true,
            last_seen: now(),
            up: true,
            exit: false,
        },
    )
    .await
    .unwrap();
    Router::try_from(row).unwrap()
}

async fn seed_subscriber(pool: &PgPool, router: &Router, confirmed: bool) -> i64 {
    SubscriberRepo::create(
        pool,
        &CreateSubscriber {
            email: "op@example.org".into(),
            router_id: router.id,
            confirmed,
        },
    )
    .await
    .unwrap()
    .id
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn health_check_passes(pool: PgPool) {
    weather_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn registry_update_is_applied(pool: PgPool) {
    let store = PgWeatherStore::new(pool.clone());
    let stale = seed_router(&pool, 'A').await;
    let keep = seed_router(&pool, 'B').await;

    let mut down = keep.clone();
    down.up = false;

    let update = RegistryUpdate {
        updated: vec![down],
        created: vec![NewRouter {
            fingerprint: fp('C'),
            name: "relayC".into(),
            welcomed: false,
            last_seen: now(),
            up: true,
            exit: true,
        }],
        evicted: vec![stale.id],
        welcomes: vec![],
    };
    store.apply_registry(&update).await.unwrap();

    let routers = store.list_routers().await.unwrap();
    let names: Vec<_> = routers.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["relayB", "relayC"]);
    assert!(!routers[0].up);
    assert!(routers[1].exit);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn evicting_router_cascades_to_subscriptions(pool: PgPool) {
    let router = seed_router(&pool, 'A').await;
    let subscriber_id = seed_subscriber(&pool, &router, true).await;
    NodeDownSubRepo::create(
        &pool,
        &CreateNodeDownSub {
            subscriber_id,
            grace_pd: 1,
        },
    )
    .await
    .unwrap();

    RouterRepo::delete(&pool, router.id).await.unwrap();

    assert!(NodeDownSubRepo::list_confirmed(&pool).await.unwrap().is_empty());
    assert!(SubscriberRepo::find_by_id(&pool, subscriber_id)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn only_confirmed_subscriptions_are_listed(pool: PgPool) {
    let store = PgWeatherStore::new(pool.clone());
    let router = seed_router(&pool, 'A').await;
    let confirmed = seed_subscriber(&pool, &router, true).await;
    let pending = seed_subscriber(&pool, &router, false).await;

    for subscriber_id in [confirmed, pending] {
        VersionSubRepo::create(
            &pool,
            &CreateVersionSub {
                subscriber_id,
                notify_type: VersionNotifyType::Obsolete,
            },
        )
        .await
        .unwrap();
        BandwidthSubRepo::create(
            &pool,
            &CreateBandwidthSub {
                subscriber_id,
                threshold: 20,
            },
        )
        .await
        .unwrap();
    }

    let version = store.version_subs().await.unwrap();
    assert_eq!(version.len(), 1);
    assert_eq!(version[0].subscriber.id, confirmed);
    assert_eq!(version[0].router.fingerprint, fp('A'));
    assert_eq!(store.bandwidth_subs().await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn emailed_tshirt_subscriptions_are_not_listed(pool: PgPool) {
    let store = PgWeatherStore::new(pool.clone());
    let router = seed_router(&pool, 'A').await;
    let subscriber_id = seed_subscriber(&pool, &router, true).await;
    TShirtSubRepo::create(&pool, &CreateTShirtSub { subscriber_id })
        .await
        .unwrap();

    let mut subs = store.tshirt_subs().await.unwrap();
    assert_eq!(subs.len(), 1);

    let mut sub = subs.remove(0).subscription;
    sub.emailed = true;
    store
        .save_subscription(&SubscriptionUpdate::TShirt(sub))
        .await
        .unwrap();

    assert!(store.tshirt_subs().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn saving_missing_subscription_is_not_found(pool: PgPool) {
    let store = PgWeatherStore::new(pool);
    let ghost = weather_core::model::BandwidthSub {
        id: 9999,
        subscriber_id: 1,
        emailed: true,
        threshold: 10,
    };
    let err = store
        .save_subscription(&SubscriptionUpdate::Bandwidth(ghost))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { id: 9999, .. }));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn deployment_time_is_recorded_once(pool: PgPool) {
    let store = PgWeatherStore::new(pool);
    let first = store.deployment_time(now()).await.unwrap();
    let second = store
        .deployment_time(now() + Duration::days(3))
        .await
        .unwrap();
    assert_eq!(first, now());
    assert_eq!(second, now());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn confirm_and_unsubscribe_by_token(pool: PgPool) {
    let router = seed_router(&pool, 'A').await;
    let id = seed_subscriber(&pool, &router, false).await;
    let row = SubscriberRepo::find_by_id(&pool, id).await.unwrap().unwrap();

    assert!(SubscriberRepo::confirm(&pool, &row.confirm_auth).await.unwrap());
    assert!(!SubscriberRepo::confirm(&pool, &row.confirm_auth).await.unwrap());
    assert!(SubscriberRepo::unsubscribe(&pool, &row.unsubs_auth)
        .await
        .unwrap());
    assert!(SubscriberRepo::find_by_id(&pool, id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn saving_node_down_state_keeps_grace_period(pool: PgPool) {
    let store = PgWeatherStore::new(pool.clone());
    let router = seed_router(&pool, 'A').await;
    let subscriber_id = seed_subscriber(&pool, &router, true).await;
    let row = NodeDownSubRepo::create(
        &pool,
        &CreateNodeDownSub {
            subscriber_id,
            grace_pd: 1,
        },
    )
    .await
    .unwrap();

    // The subscriber changes their preference while a pass holds the old row.
    let mut evaluated = weather_core::model::NodeDownSub::from(row);
    sqlx::query("UPDATE node_down_subs SET grace_pd = 24 WHERE id = $1")
        .bind(evaluated.id)
        .execute(&pool)
        .await
        .unwrap();

    evaluated.triggered = true;
    evaluated.last_changed = now();
    store
        .save_subscription(&SubscriptionUpdate::NodeDown(evaluated))
        .await
        .unwrap();

    let subs = store.node_down_subs().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert!(subs[0].subscription.triggered);
    assert_eq!(subs[0].subscription.last_changed, now());
    assert_eq!(subs[0].subscription.grace_pd, 24);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires PostgreSQL via DATABASE_URL"]
async fn unreadable_version_row_is_skipped(pool: PgPool) {
    let store = PgWeatherStore::new(pool.clone());
    let router = seed_router(&pool, 'A').await;
    let subscriber_id = seed_subscriber(&pool, &router, true).await;
    let mut ids = Vec::new();
    for _ in 0..2 {
        let row = VersionSubRepo::create(
            &pool,
            &CreateVersionSub {
                subscriber_id,
                notify_type: VersionNotifyType::Obsolete,
            },
        )
        .await
        .unwrap();
        ids.push(row.id);
    }

    sqlx::query("ALTER TABLE version_subs DROP CONSTRAINT version_subs_notify_type_check")
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE version_subs SET notify_type = 'UNSTABLE' WHERE id = $1")
        .bind(ids[0])
        .execute(&pool)
        .await
        .unwrap();

    let subs = store.version_subs().await.unwrap();
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].subscription.id, ids[1]);
}
