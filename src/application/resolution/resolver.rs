//! Offering resolution engine.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::cache::ResolutionCache;
use super::{ResolveError, ResolveOfferings, ResolvedOfferings};
use crate::domain::entities::{Category, Description, Offering, PriceComponent, PricePlan, Service};
use crate::domain::repositories::{CategoryRepository, ServiceRepository};
use crate::infrastructure::rdf::vocabulary::*;
use crate::infrastructure::rdf::{ModelLoader, RdfModel, strip_delimiters};
use crate::utils::slugify;

const OFFERINGS_QUERY: &str = "SELECT ?x WHERE { ?x a usdl:ServiceOffering . }";

/// Builds the offering graph of a USDL document.
///
/// Services and categories are resolved by natural key: first from the
/// run's [`ResolutionCache`], then from storage, and only then created.
/// Whatever is found or created is cached immediately, so every offering of
/// the document that mentions the same key shares one instance.
pub struct OfferingResolver<L: ModelLoader, S: ServiceRepository, C: CategoryRepository> {
    loader: Arc<L>,
    service_repository: Arc<S>,
    category_repository: Arc<C>,
}

impl<L: ModelLoader, S: ServiceRepository, C: CategoryRepository> OfferingResolver<L, S, C> {
    pub fn new(loader: Arc<L>, service_repository: Arc<S>, category_repository: Arc<C>) -> Self {
        Self {
            loader,
            service_repository,
            category_repository,
        }
    }

    /// Loads the document at `url` and resolves it.
    ///
    /// An unreachable document resolves to an empty result.
    pub async fn resolve_url(&self, url: &str) -> Result<ResolvedOfferings, ResolveError> {
        let Some(model) = self.loader.load(url).await? else {
            warn!(url = %url, "Description document unavailable, no offerings resolved");
            return Ok(ResolvedOfferings::default());
        };

        self.resolve_model(&model).await
    }

    /// Resolves every offering of an already parsed model.
    ///
    /// Offering URIs are resolved once each, in encounter order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidPrice`] if a price value is missing or
    /// not a number, and [`ResolveError::Lookup`] if storage fails.
    pub async fn resolve_model(&self, model: &RdfModel) -> Result<ResolvedOfferings, ResolveError> {
        let mut cache = ResolutionCache::new();
        let mut seen = HashSet::new();
        let mut offerings = Vec::new();

        for subject in model.query_uris(&with_prefixes(OFFERINGS_QUERY), "x")? {
            if !seen.insert(subject.clone()) {
                continue;
            }
            offerings.push(self.resolve_offering(model, &subject, &mut cache).await?);
        }

        info!(
            offerings = offerings.len(),
            services = cache.service_count(),
            categories = cache.category_count(),
            "Resolved offerings"
        );

        let (services, categories) = cache.into_parts();

        Ok(ResolvedOfferings {
            offerings,
            services,
            categories,
        })
    }

    async fn resolve_offering(
        &self,
        model: &RdfModel,
        subject: &str,
        cache: &mut ResolutionCache,
    ) -> Result<Offering, ResolveError> {
        let uri = strip_delimiters(subject);

        let display_name = model
            .literal(subject, DCTERMS_TITLE)?
            .unwrap_or_else(|| uri.to_string());
        let mut name = slugify(&display_name);
        if name.is_empty() {
            name = slugify(uri);
        }

        let mut offering = Offering::new(uri, name, display_name);
        offering.description = model.literal(subject, DCTERMS_DESCRIPTION)?;
        offering.version = model.literal(subject, USDL_VERSION_INFO)?;
        offering.image_url = model
            .object_uri(subject, FOAF_THUMBNAIL)?
            .map(|thumbnail| strip_delimiters(&thumbnail).to_string());

        for plan in model.object_uris(subject, USDL_HAS_PRICE_PLAN)? {
            offering.add_price_plan(resolve_price_plan(model, &plan)?);
        }

        for service_subject in model.object_uris(subject, USDL_INCLUDES)? {
            let service = self.resolve_service(model, &service_subject, cache).await?;
            offering.categories.extend(service.categories);
            offering.services.insert(service.uri);
        }

        debug!(
            uri = %offering.uri,
            name = %offering.name,
            price_plans = offering.price_plans.len(),
            services = offering.services.len(),
            "Resolved offering"
        );

        Ok(offering)
    }

    /// Resolves a service and caches it. Returns a copy of the cached instance.
    async fn resolve_service(
        &self,
        model: &RdfModel,
        subject: &str,
        cache: &mut ResolutionCache,
    ) -> Result<Service, ResolveError> {
        let uri = strip_delimiters(subject);

        let mut service = match cache.service(uri) {
            Some(cached) => cached.clone(),
            None => self
                .service_repository
                .find_by_uri(uri)
                .await?
                .unwrap_or_else(|| Service::new(uri)),
        };

        service.display_name = model.literal(subject, DCTERMS_TITLE)?;
        service.comment = model.literal(subject, DCTERMS_DESCRIPTION)?;
        service.categories = self.resolve_categories(model, subject, cache).await?;

        debug!(uri, persisted = service.is_persisted(), "Resolved service");

        cache.put_service(service.clone());
        Ok(service)
    }

    async fn resolve_categories(
        &self,
        model: &RdfModel,
        service_subject: &str,
        cache: &mut ResolutionCache,
    ) -> Result<BTreeSet<String>, ResolveError> {
        let mut names = BTreeSet::new();

        for label in model.blank_node_labels(service_subject, USDL_HAS_CLASSIFICATION)? {
            let name = slugify(&label);
            if name.is_empty() {
                warn!(service = service_subject, label = %label, "Skipping classification without a usable name");
                continue;
            }

            let mut category = match cache.category(&name) {
                Some(cached) => cached.clone(),
                None => self
                    .category_repository
                    .find_by_name(&name)
                    .await?
                    .unwrap_or_else(|| Category::new(&name, &label)),
            };
            category.display_name = label;

            cache.put_category(category);
            names.insert(name);
        }

        Ok(names)
    }
}

#[async_trait]
impl<L, S, C> ResolveOfferings for OfferingResolver<L, S, C>
where
    L: ModelLoader,
    S: ServiceRepository,
    C: CategoryRepository,
{
    async fn resolve_offerings(
        &self,
        description: &Description,
    ) -> Result<ResolvedOfferings, ResolveError> {
        self.resolve_url(&description.url).await
    }
}

fn resolve_price_plan(model: &RdfModel, subject: &str) -> Result<PricePlan, ResolveError> {
    let mut plan = PricePlan::new(
        model.literal(subject, DCTERMS_TITLE)?,
        model.literal(subject, DCTERMS_DESCRIPTION)?,
    );

    for component in model.object_uris(subject, PRICE_HAS_PRICE_COMPONENT)? {
        plan.add_component(resolve_price_component(model, &component)?);
    }

    Ok(plan)
}

fn resolve_price_component(model: &RdfModel, subject: &str) -> Result<PriceComponent, ResolveError> {
    let raw_value = model.literal(subject, GR_HAS_CURRENCY_VALUE)?;
    let value = raw_value
        .as_deref()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| ResolveError::InvalidPrice {
            component: strip_delimiters(subject).to_string(),
            value: raw_value.clone(),
        })?;

    Ok(PriceComponent {
        title: model.literal(subject, DCTERMS_TITLE)?,
        comment: model.literal(subject, DCTERMS_DESCRIPTION)?,
        currency: model.literal(subject, GR_HAS_CURRENCY)?,
        unit: model.literal(subject, GR_HAS_UNIT_OF_MEASUREMENT)?,
        value,
    })
}
