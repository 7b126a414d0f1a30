//! Product reviews.

use common::{ProductId, ReviewId, UserId};
use store::{Catalog, OrderStore, Review, ReviewStore};

use crate::error::{DomainError, ReviewError};

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 5;

/// Service for submitting and listing product reviews.
///
/// A user has at most one review per product. A review is verified when its
/// author has bought the product, re-evaluated on every submission.
pub struct ReviewService<S> {
    store: S,
}

impl<S> ReviewService<S>
where
    S: Catalog + OrderStore + ReviewStore,
{
    /// Creates a new review service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates the user's review of a product, or updates it in place.
    #[tracing::instrument(skip(self, comment))]
    pub async fn submit(
        &self,
        user_id: UserId,
        product_id: ProductId,
        rating: u8,
        comment: &str,
    ) -> Result<Review, DomainError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ReviewError::InvalidRating(rating).into());
        }
        if self.store.get_product(product_id).await?.is_none() {
            return Err(ReviewError::ProductNotFound(product_id).into());
        }

        let mut review = match self.store.find_review(user_id, product_id).await? {
            Some(mut existing) => {
                existing.rating = rating;
                existing.comment = comment.to_string();
                existing
            }
            None => Review::new(product_id, user_id, rating, comment),
        };
        review.is_verified = self.store.has_purchased(user_id, product_id).await?;

        self.store.save_review(&review).await?;
        tracing::info!(
            review_id = %review.id,
            verified = review.is_verified,
            "review saved"
        );
        Ok(review)
    }

    /// Lists the reviews of a product, newest first.
    pub async fn reviews_for(&self, product_id: ProductId) -> Result<Vec<Review>, DomainError> {
        Ok(self.store.reviews_for_product(product_id).await?)
    }

    /// Deletes a review written by `user_id`.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, user_id: UserId, review_id: ReviewId) -> Result<(), DomainError> {
        let review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or(ReviewError::ReviewNotFound(review_id))?;

        if review.user_id != user_id {
            return Err(ReviewError::NotAuthor(review_id).into());
        }

        self.store.delete_review(review_id).await?;
        Ok(())
    }
}
