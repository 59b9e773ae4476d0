mod common;

use std::sync::Arc;

use chrono::Utc;
use marketplace_catalog::AppError;
use marketplace_catalog::application::resolution::{OrphanCandidates, sweep_orphans};
use marketplace_catalog::domain::entities::{
    Category, Description, NewRating, Offering, PriceComponent, PricePlan, Service,
};
use marketplace_catalog::domain::repositories::{
    CatalogTransaction, CategoryRepository, DescriptionRepository, OfferingRepository,
    ServiceRepository,
};
use marketplace_catalog::infrastructure::persistence::{
    PgCategoryRepository, PgDescriptionRepository, PgOfferingRepository, PgServiceRepository,
};
use sqlx::PgPool;

fn offering(uri: &str, services: &[&str], categories: &[&str]) -> Offering {
    let name = uri.rsplit('/').next().unwrap_or(uri);
    let mut offering = Offering::new(uri, name, name.to_uppercase());
    offering.services = services.iter().map(|s| s.to_string()).collect();
    offering.categories = categories.iter().map(|c| c.to_string()).collect();
    offering
}

fn description(store_id: i64, creator_id: i64, name: &str, offerings: Vec<Offering>) -> Description {
    let mut description = Description {
        id: None,
        store_id,
        name: name.to_string(),
        display_name: name.to_string(),
        url: format!("http://example.com/{name}.rdf"),
        comment: None,
        creator_id,
        last_editor_id: creator_id,
        registered_at: Utc::now(),
        offerings: Vec::new(),
    };
    for offering in offerings {
        description.add_offering(offering);
    }
    description
}

fn service(uri: &str, categories: &[&str]) -> Service {
    let mut service = Service::new(uri);
    service.display_name = Some(uri.to_string());
    service.categories = categories.iter().map(|c| c.to_string()).collect();
    service
}

/// Saves categories `compute`, `storage` and services `s1` (compute),
/// `s2` (storage).
async fn save_shared(tx: &mut dyn CatalogTransaction) {
    tx.save_category(&Category::new("compute", "Compute"))
        .await
        .unwrap();
    tx.save_category(&Category::new("storage", "Storage"))
        .await
        .unwrap();
    tx.save_service(&service("http://s/1", &["compute"]))
        .await
        .unwrap();
    tx.save_service(&service("http://s/2", &["storage"]))
        .await
        .unwrap();
}

fn priced(mut offering: Offering, value: f64) -> Offering {
    let mut plan = PricePlan::new(Some("Basic".to_string()), None);
    plan.add_component(PriceComponent {
        title: Some("Monthly fee".to_string()),
        comment: None,
        currency: Some("EUR".to_string()),
        unit: Some("month".to_string()),
        value,
    });
    offering.add_price_plan(plan);
    offering
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_save_description_round_trip(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    save_shared(tx.as_mut()).await;
    let saved = tx
        .save_description(&description(
            store_id,
            user_id,
            "sample",
            vec![
                priced(
                    offering("http://o/a", &["http://s/1", "http://s/2"], &["compute", "storage"]),
                    12.5,
                ),
                offering("http://o/b", &["http://s/2"], &["storage"]),
            ],
        ))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert!(saved.is_persisted());
    assert!(saved.offerings.iter().all(|o| o.is_persisted()));

    let loaded = repo
        .find_by_name_and_store("fiware", "sample")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.id, saved.id);
    let uris: Vec<&str> = loaded.offerings.iter().map(|o| o.uri.as_str()).collect();
    assert_eq!(uris, vec!["http://o/a", "http://o/b"]);

    let a = loaded.offering("http://o/a").unwrap();
    assert_eq!(a.id, saved.offerings[0].id);
    assert_eq!(a.described_in, saved.id);
    assert_eq!(a.services.len(), 2);
    assert!(a.categories.contains("compute"));
    assert_eq!(a.price_plans[0].components[0].value, 12.5);
    assert_eq!(a.price_plans[0].components[0].currency.as_deref(), Some("EUR"));

    let s1 = PgServiceRepository::new(pool.clone())
        .find_by_uri("http://s/1")
        .await
        .unwrap()
        .unwrap();
    assert!(s1.categories.contains("compute"));
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_resave_keeps_ids_and_replaces_relations(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    save_shared(tx.as_mut()).await;
    let saved = tx
        .save_description(&description(
            store_id,
            user_id,
            "sample",
            vec![
                priced(offering("http://o/a", &["http://s/1"], &["compute"]), 10.0),
                offering("http://o/b", &["http://s/2"], &["storage"]),
            ],
        ))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let mut changed = saved.clone();
    let mut offerings = changed.take_offerings();
    offerings.reverse();
    offerings[1].services = ["http://s/2".to_string()].into();
    offerings[1].categories = ["storage".to_string()].into();
    offerings[1].price_plans.clear();
    for offering in offerings {
        changed.add_offering(offering);
    }

    let mut tx = repo.begin().await.unwrap();
    tx.save_description(&changed).await.unwrap();
    tx.commit().await.unwrap();

    let loaded = repo
        .find_by_name_and_store("fiware", "sample")
        .await
        .unwrap()
        .unwrap();
    let uris: Vec<&str> = loaded.offerings.iter().map(|o| o.uri.as_str()).collect();
    assert_eq!(uris, vec!["http://o/b", "http://o/a"]);

    let a = loaded.offering("http://o/a").unwrap();
    assert_eq!(a.id, saved.offering("http://o/a").unwrap().id);
    assert_eq!(
        a.services.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["http://s/2"]
    );
    assert!(a.price_plans.is_empty());

    let plans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM price_plans")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_eq!(plans, 0);
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_upserts_reuse_natural_keys(pool: PgPool) {
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    let first = tx
        .save_category(&Category::new("storage", "Storage"))
        .await
        .unwrap();
    let second = tx
        .save_category(&Category::new("storage", "Storage v2"))
        .await
        .unwrap();
    assert_eq!(first, second);

    let service_id = tx
        .save_service(&service("http://s/1", &["storage"]))
        .await
        .unwrap();
    let mut renamed = service("http://s/1", &[]);
    renamed.display_name = Some("Renamed".to_string());
    assert_eq!(tx.save_service(&renamed).await.unwrap(), service_id);
    tx.commit().await.unwrap();

    let category = PgCategoryRepository::new(pool.clone())
        .find_by_name("storage")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(category.display_name, "Storage v2");

    let stored = PgServiceRepository::new(pool.clone())
        .find_by_uri("http://s/1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.display_name.as_deref(), Some("Renamed"));
    assert!(stored.categories.is_empty());
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_delete_description_sweeps_only_orphans(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    save_shared(tx.as_mut()).await;
    let first = tx
        .save_description(&description(
            store_id,
            user_id,
            "first",
            vec![offering(
                "http://o/a",
                &["http://s/1", "http://s/2"],
                &["compute", "storage"],
            )],
        ))
        .await
        .unwrap();
    tx.save_description(&description(
        store_id,
        user_id,
        "second",
        vec![offering("http://o/d", &["http://s/2"], &["storage"])],
    ))
    .await
    .unwrap();
    assert_eq!(tx.count_service_references("http://s/2").await.unwrap(), 2);
    assert_eq!(tx.count_category_references("compute").await.unwrap(), 1);
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let removed = tx.delete_description(first.id.unwrap()).await.unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(tx.count_service_references("http://s/1").await.unwrap(), 0);
    assert_eq!(tx.count_service_references("http://s/2").await.unwrap(), 1);

    let report = sweep_orphans(tx.as_mut(), &OrphanCandidates::from_offerings(&removed))
        .await
        .unwrap();
    tx.commit().await.unwrap();

    assert_eq!(report.deleted_services, vec!["http://s/1".to_string()]);
    assert_eq!(report.deleted_categories, vec!["compute".to_string()]);

    let services = PgServiceRepository::new(pool.clone());
    assert!(services.find_by_uri("http://s/1").await.unwrap().is_none());
    assert!(services.find_by_uri("http://s/2").await.unwrap().is_some());
    let names: Vec<String> = PgCategoryRepository::new(pool.clone())
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["storage".to_string()]);
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_delete_store_returns_its_offerings(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    save_shared(tx.as_mut()).await;
    tx.save_description(&description(
        store_id,
        user_id,
        "first",
        vec![offering("http://o/a", &["http://s/1"], &["compute"])],
    ))
    .await
    .unwrap();
    tx.save_description(&description(
        store_id,
        user_id,
        "second",
        vec![offering("http://o/b", &["http://s/2"], &["storage"])],
    ))
    .await
    .unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let removed = tx.delete_store(store_id).await.unwrap();
    tx.commit().await.unwrap();

    let uris: Vec<&str> = removed.iter().map(|o| o.uri.as_str()).collect();
    assert_eq!(uris, vec!["http://o/a", "http://o/b"]);
    assert!(removed[0].services.contains("http://s/1"));

    let offerings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM offerings")
        .fetch_one(pool.as_ref())
        .await
        .unwrap();
    assert_eq!(offerings, 0);
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_rollback_discards_writes(pool: PgPool) {
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    save_shared(tx.as_mut()).await;
    tx.rollback().await.unwrap();

    assert!(
        PgCategoryRepository::new(pool.clone())
            .list()
            .await
            .unwrap()
            .is_empty()
    );
    assert!(matches!(
        tx.commit().await,
        Err(AppError::Internal { .. })
    ));
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_offering_uri_is_unique_across_descriptions(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let repo = PgDescriptionRepository::new(Arc::new(pool));

    let mut tx = repo.begin().await.unwrap();
    tx.save_description(&description(
        store_id,
        user_id,
        "first",
        vec![offering("http://o/a", &[], &[])],
    ))
    .await
    .unwrap();

    let err = tx
        .save_description(&description(
            store_id,
            user_id,
            "second",
            vec![offering("http://o/a", &[], &[])],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
    tx.rollback().await.unwrap();
}

#[sqlx::test(migrations = false, fixtures("schema"))]
async fn test_ratings_are_unique_and_go_with_the_offering(pool: PgPool) {
    let user_id = common::create_test_user(&pool, "alice").await;
    let store_id = common::create_test_store(&pool, "fiware", user_id).await;
    let pool = Arc::new(pool);
    let repo = PgDescriptionRepository::new(pool.clone());
    let offerings = PgOfferingRepository::new(pool.clone());

    let mut tx = repo.begin().await.unwrap();
    let saved = tx
        .save_description(&description(
            store_id,
            user_id,
            "sample",
            vec![offering("http://o/a", &[], &[])],
        ))
        .await
        .unwrap();
    tx.commit().await.unwrap();
    let offering_id = saved.offerings[0].id.unwrap();

    let mut rating = offerings
        .create_rating(
            offering_id,
            user_id,
            NewRating {
                score: 4,
                comment: Some("Good".to_string()),
            },
        )
        .await
        .unwrap();
    let err = offerings
        .create_rating(
            offering_id,
            user_id,
            NewRating {
                score: 2,
                comment: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.message(), "You have already rated this offering");

    rating.score = 1;
    let updated = offerings.update_rating(rating.clone()).await.unwrap();
    assert_eq!(updated.score, 1);
    assert_eq!(updated.comment.as_deref(), Some("Good"));
    assert_eq!(offerings.list_ratings(offering_id).await.unwrap().len(), 1);

    let mut tx = repo.begin().await.unwrap();
    tx.delete_offering(offering_id).await.unwrap();
    tx.commit().await.unwrap();

    assert!(
        offerings
            .find_rating(offering_id, rating.id)
            .await
            .unwrap()
            .is_none()
    );
}
