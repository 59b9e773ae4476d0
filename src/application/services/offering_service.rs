//! Queries over offerings and categories, and offering ratings.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use validator::Validate;

use crate::application::authorization::ensure_creator;
use crate::domain::entities::{Category, NewRating, Offering, Rating, UpdateRating, User};
use crate::domain::repositories::{
    CategoryRepository, DescriptionRepository, OfferingRepository, StoreRepository,
};
use crate::error::AppError;
use crate::utils::Page;

/// Service for listing and fetching offerings and for rating them.
///
/// Offerings are written only through their description; the only writes
/// here are ratings. Scoped listings fail with [`AppError::NotFound`] when the
/// store or description does not exist rather than returning an empty page.
pub struct OfferingService<O, S, D, C>
where
    O: OfferingRepository,
    S: StoreRepository,
    D: DescriptionRepository,
    C: CategoryRepository,
{
    offering_repository: Arc<O>,
    store_repository: Arc<S>,
    description_repository: Arc<D>,
    category_repository: Arc<C>,
}

impl<O, S, D, C> OfferingService<O, S, D, C>
where
    O: OfferingRepository,
    S: StoreRepository,
    D: DescriptionRepository,
    C: CategoryRepository,
{
    pub fn new(
        offering_repository: Arc<O>,
        store_repository: Arc<S>,
        description_repository: Arc<D>,
        category_repository: Arc<C>,
    ) -> Self {
        Self {
            offering_repository,
            store_repository,
            description_repository,
            category_repository,
        }
    }

    pub async fn list(&self, page: Page) -> Result<Vec<Offering>, AppError> {
        self.offering_repository.list(page).await
    }

    /// Lists the offerings of every description in a store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store does not exist.
    pub async fn list_by_store(&self, store_name: &str, page: Page) -> Result<Vec<Offering>, AppError> {
        self.ensure_store(store_name).await?;
        self.offering_repository.list_by_store(store_name, page).await
    }

    /// Lists the offerings of one description.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store or description does not exist.
    pub async fn list_by_description(
        &self,
        store_name: &str,
        description_name: &str,
        page: Page,
    ) -> Result<Vec<Offering>, AppError> {
        self.ensure_description(store_name, description_name).await?;
        self.offering_repository
            .list_by_description(store_name, description_name, page)
            .await
    }

    /// Gets one offering by store, description and offering name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if any of the three does not exist.
    pub async fn get(
        &self,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
    ) -> Result<Offering, AppError> {
        self.ensure_description(store_name, description_name).await?;

        self.offering_repository
            .find(store_name, description_name, offering_name)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Offering {offering_name} not found"),
                    json!({
                        "store": store_name,
                        "description": description_name,
                        "offering": offering_name,
                    }),
                )
            })
    }

    /// Rates an offering as `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the store, description or offering
    /// does not exist, [`AppError::Validation`] if the score is outside
    /// `0..=5`, and [`AppError::Conflict`] if `actor` already rated it.
    pub async fn create_rating(
        &self,
        actor: &User,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
        rating: NewRating,
    ) -> Result<Rating, AppError> {
        rating.validate()?;

        let offering = self.get(store_name, description_name, offering_name).await?;
        let offering_id = persisted_id(&offering)?;

        let rating = self
            .offering_repository
            .create_rating(offering_id, actor.id, rating)
            .await?;

        info!(
            offering = %offering.uri,
            user = %actor.user_name,
            score = rating.score,
            "Offering rated"
        );
        Ok(rating)
    }

    /// Changes a rating. Only its author may do so.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the offering or the rating does not
    /// exist and [`AppError::Unauthorized`] if `actor` is not the author.
    pub async fn update_rating(
        &self,
        actor: &User,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
        rating_id: i64,
        update: UpdateRating,
    ) -> Result<Rating, AppError> {
        update.validate()?;

        let offering = self.get(store_name, description_name, offering_name).await?;
        let offering_id = persisted_id(&offering)?;

        let mut rating = self
            .offering_repository
            .find_rating(offering_id, rating_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(
                    format!("Rating {rating_id} not found"),
                    json!({ "offering": offering_name, "rating": rating_id }),
                )
            })?;
        ensure_creator(actor, rating.user_id, &format!("update rating {rating_id}"))?;

        rating.apply(update);
        let rating = self.offering_repository.update_rating(rating).await?;

        info!(offering = %offering.uri, rating = rating_id, "Rating updated");
        Ok(rating)
    }

    /// Lists the ratings of one offering.
    pub async fn ratings(
        &self,
        store_name: &str,
        description_name: &str,
        offering_name: &str,
    ) -> Result<Vec<Rating>, AppError> {
        let offering = self.get(store_name, description_name, offering_name).await?;
        self.offering_repository
            .list_ratings(persisted_id(&offering)?)
            .await
    }

    /// Lists every category currently referenced by the catalog.
    pub async fn categories(&self) -> Result<Vec<Category>, AppError> {
        self.category_repository.list().await
    }

    async fn ensure_store(&self, store_name: &str) -> Result<(), AppError> {
        match self.store_repository.find_by_name(store_name).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(
                format!("Store {store_name} not found"),
                json!({ "store": store_name }),
            )),
        }
    }

    async fn ensure_description(
        &self,
        store_name: &str,
        description_name: &str,
    ) -> Result<(), AppError> {
        self.ensure_store(store_name).await?;

        match self
            .description_repository
            .find_by_name_and_store(store_name, description_name)
            .await?
        {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(
                format!("Description {description_name} not found in store {store_name}"),
                json!({ "store": store_name, "description": description_name }),
            )),
        }
    }
}

fn persisted_id(offering: &Offering) -> Result<i64, AppError> {
    offering.id.ok_or_else(|| {
        AppError::internal("Stored offering has no id", json!({ "uri": offering.uri }))
    })
}
