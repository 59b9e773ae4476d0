#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use marketplace_catalog::application::resolution::OfferingResolver;
use marketplace_catalog::application::services::{
    DescriptionService, OfferingService, StoreService, UserService,
};
use marketplace_catalog::domain::entities::{CreateStore, NewUser, Store, User};
use marketplace_catalog::infrastructure::persistence::InMemoryCatalog;
use marketplace_catalog::infrastructure::rdf::{ModelLoader, RdfError, RdfModel};
use oxigraph::io::RdfFormat;
use sqlx::PgPool;

pub const PREFIXES: &str = r#"
@prefix usdl: <http://www.linked-usdl.org/ns/usdl-core#> .
@prefix price: <http://www.linked-usdl.org/ns/usdl-price#> .
@prefix gr: <http://purl.org/goodrelations/v1#> .
@prefix dcterms: <http://purl.org/dc/terms/> .
@prefix foaf: <http://xmlns.com/foaf/0.1/> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix ex: <http://example.com/> .
"#;

/// Offerings A (services s1, s2) and B (service s2).
pub const DOC_AB: &str = r#"
ex:a a usdl:ServiceOffering ;
    dcterms:title "Offering A" ;
    usdl:versionInfo "1.0" ;
    usdl:hasPricePlan ex:plan-a ;
    usdl:includes ex:s1, ex:s2 .

ex:b a usdl:ServiceOffering ;
    dcterms:title "Offering B" ;
    usdl:includes ex:s2 .

ex:plan-a dcterms:title "Basic" ;
    price:hasPriceComponent ex:fee-a .

ex:fee-a dcterms:title "Monthly fee" ;
    gr:hasCurrency "EUR" ;
    gr:hasUnitOfMeasurement "month" ;
    gr:hasCurrencyValue "10.0" .

ex:s1 dcterms:title "Compute" ;
    usdl:hasClassification [ rdfs:label "Compute" ] .

ex:s2 dcterms:title "Storage" ;
    usdl:hasClassification [ rdfs:label "Storage" ] .
"#;

/// Offering A changed to include only s2, offering C new with s3.
pub const DOC_AC: &str = r#"
ex:a a usdl:ServiceOffering ;
    dcterms:title "Offering A" ;
    usdl:versionInfo "2.0" ;
    usdl:includes ex:s2 .

ex:c a usdl:ServiceOffering ;
    dcterms:title "Offering C" ;
    usdl:includes ex:s3 .

ex:s2 dcterms:title "Storage v2" ;
    usdl:hasClassification [ rdfs:label "Storage" ] .

ex:s3 dcterms:title "Analytics" ;
    usdl:hasClassification [ rdfs:label "Big Data" ] .
"#;

/// Offering D sharing service s2 with [`DOC_AB`].
pub const DOC_D: &str = r#"
ex:d a usdl:ServiceOffering ;
    dcterms:title "Offering D" ;
    usdl:includes ex:s2 .

ex:s2 dcterms:title "Storage" ;
    usdl:hasClassification [ rdfs:label "Storage" ] .
"#;

pub const BAD_PRICE: &str = r#"
ex:a a usdl:ServiceOffering ;
    dcterms:title "Offering A" ;
    usdl:hasPricePlan ex:plan .

ex:plan price:hasPriceComponent ex:fee .

ex:fee gr:hasCurrencyValue "ten" .
"#;

pub fn turtle(body: &str) -> String {
    format!("{PREFIXES}{body}")
}

/// [`ModelLoader`] serving Turtle documents registered by URL.
///
/// Unknown URLs behave like unreachable documents. Documents can be replaced
/// between calls to simulate a changed remote description.
#[derive(Clone, Default)]
pub struct FixtureLoader {
    documents: Arc<Mutex<HashMap<String, String>>>,
}

impl FixtureLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, document: String) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), document);
    }
}

#[async_trait]
impl ModelLoader for FixtureLoader {
    async fn load(&self, url: &str) -> Result<Option<RdfModel>, RdfError> {
        let document = self.documents.lock().unwrap().get(url).cloned();
        match document {
            Some(document) => {
                RdfModel::parse(document.as_bytes(), RdfFormat::Turtle, Some(url)).map(Some)
            }
            None => Ok(None),
        }
    }
}

pub type Resolver = OfferingResolver<FixtureLoader, InMemoryCatalog, InMemoryCatalog>;

/// Every service wired to one in-memory catalog.
pub struct TestCatalog {
    pub catalog: Arc<InMemoryCatalog>,
    pub loader: FixtureLoader,
    pub users: UserService<InMemoryCatalog>,
    pub stores: StoreService<InMemoryCatalog, InMemoryCatalog>,
    pub descriptions: DescriptionService<InMemoryCatalog, InMemoryCatalog, Resolver>,
    pub offerings: OfferingService<InMemoryCatalog, InMemoryCatalog, InMemoryCatalog, InMemoryCatalog>,
}

impl TestCatalog {
    pub fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let loader = FixtureLoader::new();
        let resolver = Arc::new(OfferingResolver::new(
            Arc::new(loader.clone()),
            catalog.clone(),
            catalog.clone(),
        ));

        Self {
            users: UserService::new(catalog.clone()),
            stores: StoreService::new(catalog.clone(), catalog.clone()),
            descriptions: DescriptionService::new(catalog.clone(), catalog.clone(), resolver),
            offerings: OfferingService::new(
                catalog.clone(),
                catalog.clone(),
                catalog.clone(),
                catalog.clone(),
            ),
            catalog,
            loader,
        }
    }

    pub async fn user(&self, user_name: &str) -> User {
        self.users
            .register(NewUser {
                user_name: user_name.to_string(),
                display_name: format!("{user_name} tester"),
                email: format!("{user_name}@example.com"),
                company: None,
            })
            .await
            .unwrap()
    }

    pub async fn store(&self, owner: &User, display_name: &str) -> Store {
        self.stores
            .create(
                owner,
                CreateStore {
                    display_name: display_name.to_string(),
                    url: "https://store.example.com".to_string(),
                    comment: None,
                },
            )
            .await
            .unwrap()
    }
}

pub async fn create_test_user(pool: &PgPool, user_name: &str) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO users (user_name, display_name, email, registered_at)
        VALUES ($1, $1, $1 || '@example.com', NOW())
        RETURNING id
        "#,
    )
    .bind(user_name)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn create_test_store(pool: &PgPool, name: &str, owner_id: i64) -> i64 {
    sqlx::query_scalar(
        r#"
        INSERT INTO stores (name, display_name, url, creator_id, last_editor_id, registered_at)
        VALUES ($1, $1, 'https://store.example.com', $2, $2, NOW())
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(owner_id)
    .fetch_one(pool)
    .await
    .unwrap()
}
