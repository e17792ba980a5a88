// region:    --- Imports
use crate::auction::model::{
    Bid, Category, CategoryCount, Comment, Listing, ListingFilter, NewListing, User,
};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;

pub use memory::MemoryLedgerStore;
pub use postgres::PostgresLedgerStore;

// endregion: --- Modules

/// Store shared by the HTTP handlers.
pub type SharedStore = Arc<dyn LedgerStore>;

// region:    --- Ledger Store Trait
/// Persistence for the auction ledger.
///
/// `place_bid` and `close_listing` must read the listing, apply
/// [`crate::auction::rules`] and write the result as one atomic step per
/// listing, so concurrent requests never validate against a stale current bid.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User>;

    async fn get_user(&self, user_id: i64) -> Result<User>;

    async fn create_category(&self, name: &str) -> Result<Category>;

    async fn get_category(&self, category_id: i64) -> Result<Category>;

    async fn create_listing(&self, listing: NewListing, now: DateTime<Utc>) -> Result<Listing>;

    async fn get_listing(&self, listing_id: i64) -> Result<Listing>;

    async fn list_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>>;

    /// Highest-priced bid on the listing, if any.
    async fn current_bid(&self, listing_id: i64) -> Result<Option<Bid>>;

    /// Newest first.
    async fn bids_for_listing(&self, listing_id: i64) -> Result<Vec<Bid>>;

    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: i64,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Bid>;

    async fn close_listing(
        &self,
        listing_id: i64,
        requester_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing>;

    /// Adds or removes the user from the listing's watchers. Idempotent.
    async fn set_watching(&self, listing_id: i64, user_id: i64, watching: bool) -> Result<()>;

    async fn watchers(&self, listing_id: i64) -> Result<Vec<i64>>;

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment>;

    /// Oldest first.
    async fn comments_for_listing(&self, listing_id: i64) -> Result<Vec<Comment>>;

    /// Every category, including those without active listings.
    async fn category_counts(&self) -> Result<Vec<CategoryCount>>;
}

// endregion: --- Ledger Store Trait
