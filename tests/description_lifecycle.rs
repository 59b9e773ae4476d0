mod common;

use common::{BAD_PRICE, DOC_AB, DOC_AC, DOC_D, TestCatalog, turtle};
use marketplace_catalog::AppError;
use marketplace_catalog::domain::entities::{
    CreateDescription, NewRating, UpdateDescription, UpdateRating,
};
use marketplace_catalog::domain::repositories::ServiceRepository;
use marketplace_catalog::utils::Page;

const AB_URL: &str = "http://example.com/ab.ttl";
const D_URL: &str = "http://example.com/d.ttl";

fn create_input(display_name: &str, url: &str) -> CreateDescription {
    CreateDescription {
        display_name: display_name.to_string(),
        url: url.to_string(),
        comment: None,
    }
}

fn category_names(categories: &[marketplace_catalog::domain::entities::Category]) -> Vec<&str> {
    categories.iter().map(|c| c.name.as_str()).collect()
}

#[tokio::test]
async fn test_create_resolves_and_persists_offerings() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    let description = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();

    assert_eq!(description.name, "ab-description");
    assert!(description.is_persisted());
    let names: Vec<&str> = description.offerings.iter().map(|o| o.name.as_str()).collect();
    assert_eq!(names, vec!["offering-a", "offering-b"]);
    assert!(description.offerings.iter().all(|o| o.described_in == description.id));

    let offering_a = &description.offerings[0];
    assert_eq!(offering_a.version.as_deref(), Some("1.0"));
    assert_eq!(offering_a.price_plans.len(), 1);
    assert_eq!(offering_a.price_plans[0].components[0].value, 10.0);
    assert_eq!(offering_a.categories.len(), 2);

    let categories = t.offerings.categories().await.unwrap();
    assert_eq!(category_names(&categories), vec!["compute", "storage"]);

    let storage = t
        .catalog
        .find_by_uri("http://example.com/s2")
        .await
        .unwrap()
        .unwrap();
    assert!(storage.is_persisted());
    assert!(storage.categories.contains("storage"));
}

#[tokio::test]
async fn test_update_merges_offerings_and_sweeps_orphans() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    let created = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();
    let id_of_a = created.offerings[0].id;

    t.loader.serve(AB_URL, turtle(DOC_AC));
    let updated = t
        .descriptions
        .refresh(&alice, &store.name, &created.name)
        .await
        .unwrap();

    let uris: Vec<&str> = updated.offerings.iter().map(|o| o.uri.as_str()).collect();
    assert_eq!(uris, vec!["http://example.com/a", "http://example.com/c"]);
    assert_eq!(updated.offerings[0].id, id_of_a);
    assert_eq!(updated.offerings[0].version.as_deref(), Some("2.0"));
    assert!(updated.offerings[0].price_plans.is_empty());

    assert!(t.catalog.find_by_uri("http://example.com/s1").await.unwrap().is_none());
    let storage = t
        .catalog
        .find_by_uri("http://example.com/s2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(storage.display_name.as_deref(), Some("Storage v2"));
    assert!(t.catalog.find_by_uri("http://example.com/s3").await.unwrap().is_some());

    let categories = t.offerings.categories().await.unwrap();
    assert_eq!(category_names(&categories), vec!["big-data", "storage"]);
}

#[tokio::test]
async fn test_refreshing_unchanged_document_keeps_ids() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    let created = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();
    let offering_ids: Vec<_> = created.offerings.iter().map(|o| o.id).collect();
    let s1 = t.catalog.find_by_uri("http://example.com/s1").await.unwrap().unwrap();
    let s2 = t.catalog.find_by_uri("http://example.com/s2").await.unwrap().unwrap();
    let categories = t.offerings.categories().await.unwrap();

    for _ in 0..2 {
        let refreshed = t
            .descriptions
            .refresh(&alice, &store.name, &created.name)
            .await
            .unwrap();
        let ids: Vec<_> = refreshed.offerings.iter().map(|o| o.id).collect();
        assert_eq!(ids, offering_ids);
        assert_eq!(refreshed.id, created.id);
    }

    let s1_after = t.catalog.find_by_uri("http://example.com/s1").await.unwrap().unwrap();
    let s2_after = t.catalog.find_by_uri("http://example.com/s2").await.unwrap().unwrap();
    assert_eq!(s1_after.id, s1.id);
    assert_eq!(s2_after.id, s2.id);

    let categories_after = t.offerings.categories().await.unwrap();
    assert_eq!(category_names(&categories_after), category_names(&categories));
    let ids = |c: &[marketplace_catalog::domain::entities::Category]| {
        c.iter().map(|c| c.id).collect::<Vec<_>>()
    };
    assert_eq!(ids(&categories_after), ids(&categories));
}

#[tokio::test]
async fn test_rating_survives_refresh_and_goes_with_offering() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let bobby = t.user("bobby").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    let created = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();
    let on_a = t
        .offerings
        .create_rating(
            &bobby,
            &store.name,
            &created.name,
            "offering-a",
            NewRating {
                score: 4,
                comment: Some("Solid".to_string()),
            },
        )
        .await
        .unwrap();
    t.offerings
        .create_rating(
            &bobby,
            &store.name,
            &created.name,
            "offering-b",
            NewRating {
                score: 2,
                comment: None,
            },
        )
        .await
        .unwrap();

    t.loader.serve(AB_URL, turtle(DOC_AC));
    t.descriptions
        .refresh(&alice, &store.name, &created.name)
        .await
        .unwrap();

    let ratings = t
        .offerings
        .ratings(&store.name, &created.name, "offering-a")
        .await
        .unwrap();
    assert_eq!(ratings, vec![on_a.clone()]);

    let updated = t
        .offerings
        .update_rating(
            &bobby,
            &store.name,
            &created.name,
            "offering-a",
            on_a.id,
            UpdateRating {
                score: Some(5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.score, 5);
    assert_eq!(updated.comment.as_deref(), Some("Solid"));

    let err = t
        .offerings
        .ratings(&store.name, &created.name, "offering-b")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_shared_service_survives_deleting_one_description() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));
    t.loader.serve(D_URL, turtle(DOC_D));

    t.descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();
    t.descriptions
        .create(&alice, &store.name, create_input("D Description", D_URL))
        .await
        .unwrap();

    let report = t
        .descriptions
        .delete(&alice, &store.name, "ab-description")
        .await
        .unwrap();

    assert_eq!(report.deleted_services, vec!["http://example.com/s1".to_string()]);
    assert_eq!(report.deleted_categories, vec!["compute".to_string()]);
    assert!(t.catalog.find_by_uri("http://example.com/s2").await.unwrap().is_some());

    let remaining = t
        .offerings
        .list_by_store(&store.name, Page::default())
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].uri, "http://example.com/d");
}

#[tokio::test]
async fn test_invalid_price_aborts_without_writes() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(BAD_PRICE));

    let err = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert!(
        t.descriptions
            .list(&store.name, Page::default())
            .await
            .unwrap()
            .is_empty()
    );
    assert!(t.offerings.categories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unparsable_document_is_rejected() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, "this is not turtle <<<".to_string());

    let err = t
        .descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Your RDF could not be parsed");
}

#[tokio::test]
async fn test_unreachable_document_creates_empty_description() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;

    let description = t
        .descriptions
        .create(
            &alice,
            &store.name,
            create_input("Missing", "http://example.com/missing.rdf"),
        )
        .await
        .unwrap();

    assert!(description.is_persisted());
    assert!(description.offerings.is_empty());
}

#[tokio::test]
async fn test_update_by_other_user_is_unauthorized() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let bobby = t.user("bobby").await;
    let store = t.store(&alice, "FIWARE Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    t.descriptions
        .create(&alice, &store.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();

    let err = t
        .descriptions
        .update(
            &bobby,
            &store.name,
            "ab-description",
            UpdateDescription {
                display_name: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "You are not authorized to update offering ab-description"
    );
}

#[tokio::test]
async fn test_offering_described_twice_is_conflict_and_rolled_back() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let first = t.store(&alice, "First Store").await;
    let second = t.store(&alice, "Second Store").await;
    t.loader.serve(AB_URL, turtle(DOC_AB));

    t.descriptions
        .create(&alice, &first.name, create_input("AB Description", AB_URL))
        .await
        .unwrap();

    let err = t
        .descriptions
        .create(&alice, &second.name, create_input("AB Copy", AB_URL))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Conflict { .. }));
    assert!(
        t.descriptions
            .list(&second.name, Page::default())
            .await
            .unwrap()
            .is_empty()
    );
    let kept = t
        .descriptions
        .get(&first.name, "ab-description")
        .await
        .unwrap();
    assert_eq!(kept.offerings.len(), 2);
}

#[tokio::test]
async fn test_duplicate_description_name_in_store() {
    let t = TestCatalog::new();
    let alice = t.user("alice").await;
    let store = t.store(&alice, "FIWARE Store").await;

    t.descriptions
        .create(&alice, &store.name, create_input("Same Name", "http://example.com/1.rdf"))
        .await
        .unwrap();

    let err = t
        .descriptions
        .create(&alice, &store.name, create_input("Same  Name!", "http://example.com/2.rdf"))
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "There is already an Offering in this Store with that name/URL"
    );
}
