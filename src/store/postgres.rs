// region:    --- Imports
use super::LedgerStore;
use crate::auction::model::{
    Bid, Category, CategoryCount, Comment, Listing, ListingFilter, NewListing, User,
};
use crate::auction::rules::{self, CloseOutcome};
use crate::database::DatabaseManager;
use crate::error::{LedgerError, Result};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Helpers
async fn ensure_user(conn: &mut PgConnection, user_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar::<_, bool>(queries::USER_EXISTS)
        .bind(user_id)
        .fetch_one(conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(LedgerError::not_found("user", user_id))
    }
}

async fn ensure_listing(conn: &mut PgConnection, listing_id: i64) -> Result<()> {
    let exists: bool = sqlx::query_scalar::<_, bool>(queries::LISTING_EXISTS)
        .bind(listing_id)
        .fetch_one(conn)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(LedgerError::not_found("listing", listing_id))
    }
}

async fn lock_category(conn: &mut PgConnection, category_id: i64) -> Result<()> {
    sqlx::query_as::<_, Category>(queries::LOCK_CATEGORY)
        .bind(category_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| LedgerError::not_found("category", category_id))
}

async fn lock_listing(conn: &mut PgConnection, listing_id: i64) -> Result<Listing> {
    sqlx::query_as::<_, Listing>(queries::LOCK_LISTING)
        .bind(listing_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| LedgerError::not_found("listing", listing_id))
}

fn username_conflict(e: sqlx::Error, username: &str) -> LedgerError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            LedgerError::Conflict(format!("username '{username}' already taken"))
        }
        _ => LedgerError::Database(e),
    }
}

// endregion: --- Helpers

// region:    --- Postgres Ledger Store
/// Ledger backed by Postgres.
///
/// Bids and closes lock the listing row with `SELECT ... FOR UPDATE` before
/// reading the current bid.
pub struct PostgresLedgerStore {
    db: Arc<DatabaseManager>,
}

impl PostgresLedgerStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(queries::INSERT_USER)
            .bind(username)
            .bind(email)
            .bind(now)
            .fetch_one(self.db.pool())
            .await
            .map_err(|e| username_conflict(e, username))
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        sqlx::query_as::<_, User>(queries::GET_USER)
            .bind(user_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| LedgerError::not_found("user", user_id))
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        Ok(sqlx::query_as::<_, Category>(queries::INSERT_CATEGORY)
            .bind(name)
            .fetch_one(self.db.pool())
            .await?)
    }

    async fn get_category(&self, category_id: i64) -> Result<Category> {
        sqlx::query_as::<_, Category>(queries::GET_CATEGORY)
            .bind(category_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| LedgerError::not_found("category", category_id))
    }

    async fn create_listing(&self, new: NewListing, now: DateTime<Utc>) -> Result<Listing> {
        self.db
            .transaction::<_, _, LedgerError>(move |tx| {
                Box::pin(async move {
                    ensure_user(&mut **tx, new.created_by).await?;
                    if let Some(category_id) = new.category_id {
                        lock_category(&mut **tx, category_id).await?;
                    }
                    let listing = sqlx::query_as::<_, Listing>(queries::INSERT_LISTING)
                        .bind(&new.title)
                        .bind(&new.description)
                        .bind(new.starting_bid)
                        .bind(&new.image_url)
                        .bind(new.category_id)
                        .bind(new.created_by)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;
                    Ok(listing)
                })
            })
            .await
    }

    async fn get_listing(&self, listing_id: i64) -> Result<Listing> {
        sqlx::query_as::<_, Listing>(queries::GET_LISTING)
            .bind(listing_id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| LedgerError::not_found("listing", listing_id))
    }

    async fn list_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        if let ListingFilter::ActiveInCategory(category_id) = filter {
            self.get_category(category_id).await?;
        }
        let sql = queries::listings_query(filter);
        let query = sqlx::query_as::<_, Listing>(&sql);
        let query = match filter {
            ListingFilter::Active => query,
            ListingFilter::ActiveInCategory(category_id) => query.bind(category_id),
            ListingFilter::CreatedBy(user_id)
            | ListingFilter::BidOnBy(user_id)
            | ListingFilter::WatchedBy(user_id) => query.bind(user_id),
        };
        Ok(query.fetch_all(self.db.pool()).await?)
    }

    async fn current_bid(&self, listing_id: i64) -> Result<Option<Bid>> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        Ok(sqlx::query_as::<_, Bid>(queries::GET_CURRENT_BID)
            .bind(listing_id)
            .fetch_optional(&mut *conn)
            .await?)
    }

    async fn bids_for_listing(&self, listing_id: i64) -> Result<Vec<Bid>> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        Ok(sqlx::query_as::<_, Bid>(queries::GET_BID_HISTORY)
            .bind(listing_id)
            .fetch_all(&mut *conn)
            .await?)
    }

    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: i64,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Bid> {
        self.db
            .transaction::<_, _, LedgerError>(move |tx| {
                Box::pin(async move {
                    let listing = lock_listing(&mut **tx, listing_id).await?;
                    ensure_user(&mut **tx, bidder_id).await?;

                    let current = sqlx::query_as::<_, Bid>(queries::GET_CURRENT_BID)
                        .bind(listing_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    rules::check_bid(&listing, current.as_ref(), price)?;

                    let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
                        .bind(bidder_id)
                        .bind(listing_id)
                        .bind(price)
                        .bind(now)
                        .fetch_one(&mut **tx)
                        .await?;
                    debug!(
                        "{:<12} --> bid {} stored for listing {}",
                        "Store", bid.id, listing_id
                    );
                    Ok(bid)
                })
            })
            .await
    }

    async fn close_listing(
        &self,
        listing_id: i64,
        requester_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        self.db
            .transaction::<_, _, LedgerError>(move |tx| {
                Box::pin(async move {
                    let listing = lock_listing(&mut **tx, listing_id).await?;
                    match rules::check_close(&listing, requester_id)? {
                        CloseOutcome::AlreadyClosed => {
                            debug!("{:<12} --> listing {} already closed", "Store", listing_id);
                            Ok(listing)
                        }
                        CloseOutcome::Closed => {
                            let closed = sqlx::query_as::<_, Listing>(queries::CLOSE_LISTING)
                                .bind(listing_id)
                                .bind(now)
                                .fetch_one(&mut **tx)
                                .await?;
                            info!("{:<12} --> listing {} closed", "Store", listing_id);
                            Ok(closed)
                        }
                    }
                })
            })
            .await
    }

    async fn set_watching(&self, listing_id: i64, user_id: i64, watching: bool) -> Result<()> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        ensure_user(&mut conn, user_id).await?;
        let sql = if watching {
            queries::WATCH_LISTING
        } else {
            queries::UNWATCH_LISTING
        };
        sqlx::query(sql)
            .bind(listing_id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    async fn watchers(&self, listing_id: i64) -> Result<Vec<i64>> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        Ok(sqlx::query_scalar::<_, i64>(queries::GET_WATCHERS)
            .bind(listing_id)
            .fetch_all(&mut *conn)
            .await?)
    }

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        ensure_user(&mut conn, author_id).await?;
        Ok(sqlx::query_as::<_, Comment>(queries::INSERT_COMMENT)
            .bind(author_id)
            .bind(listing_id)
            .bind(text)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?)
    }

    async fn comments_for_listing(&self, listing_id: i64) -> Result<Vec<Comment>> {
        let mut conn = self.db.pool().acquire().await?;
        ensure_listing(&mut conn, listing_id).await?;
        Ok(sqlx::query_as::<_, Comment>(queries::GET_COMMENTS)
            .bind(listing_id)
            .fetch_all(&mut *conn)
            .await?)
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        Ok(
            sqlx::query_as::<_, CategoryCount>(queries::GET_CATEGORY_COUNTS)
                .fetch_all(self.db.pool())
                .await?,
        )
    }
}

// endregion: --- Postgres Ledger Store
