// region:    --- Imports
use super::LedgerStore;
use crate::auction::model::{
    Bid, Category, CategoryCount, Comment, Listing, ListingFilter, NewListing, User,
};
use crate::auction::rules::{self, CloseOutcome};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tokio::sync::Mutex;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Tables
/// Rows are never deleted, so an id is its position plus one.
#[derive(Default)]
struct Tables {
    users: Vec<User>,
    categories: Vec<Category>,
    listings: Vec<Listing>,
    bids: Vec<Bid>,
    comments: Vec<Comment>,
    /// (listing_id, user_id)
    watchlist: BTreeSet<(i64, i64)>,
}

impl Tables {
    fn user(&self, user_id: i64) -> Result<&User> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| LedgerError::not_found("user", user_id))
    }

    fn category(&self, category_id: i64) -> Result<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .ok_or_else(|| LedgerError::not_found("category", category_id))
    }

    fn listing_mut(&mut self, listing_id: i64) -> Result<&mut Listing> {
        self.listings
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| LedgerError::not_found("listing", listing_id))
    }

    fn listing(&self, listing_id: i64) -> Result<&Listing> {
        self.listings
            .iter()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| LedgerError::not_found("listing", listing_id))
    }

    fn current_bid(&self, listing_id: i64) -> Option<&Bid> {
        self.bids
            .iter()
            .filter(|b| b.listing_id == listing_id)
            .max_by(|a, b| a.price.cmp(&b.price).then(b.id.cmp(&a.id)))
    }

    fn next_id(len: usize) -> i64 {
        len as i64 + 1
    }
}

// endregion: --- Tables

// region:    --- Memory Ledger Store
/// Ledger kept in process memory.
///
/// Every operation holds the table lock from its first read to its last
/// write, which serialises bids the same way the Postgres row lock does.
#[derive(Default)]
pub struct MemoryLedgerStore {
    tables: Mutex<Tables>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create_user(
        &self,
        username: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(LedgerError::Conflict(format!(
                "username '{username}' already taken"
            )));
        }
        let user = User {
            id: Tables::next_id(tables.users.len()),
            username: username.to_string(),
            email: email.map(str::to_string),
            created_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: i64) -> Result<User> {
        self.tables.lock().await.user(user_id).cloned()
    }

    async fn create_category(&self, name: &str) -> Result<Category> {
        let mut tables = self.tables.lock().await;
        let category = Category {
            id: Tables::next_id(tables.categories.len()),
            name: name.to_string(),
        };
        tables.categories.push(category.clone());
        Ok(category)
    }

    async fn get_category(&self, category_id: i64) -> Result<Category> {
        self.tables.lock().await.category(category_id).cloned()
    }

    async fn create_listing(&self, new: NewListing, now: DateTime<Utc>) -> Result<Listing> {
        let mut tables = self.tables.lock().await;
        tables.user(new.created_by)?;
        if let Some(category_id) = new.category_id {
            tables.category(category_id)?;
        }
        let listing = Listing {
            id: Tables::next_id(tables.listings.len()),
            title: new.title,
            description: new.description,
            starting_bid: new.starting_bid,
            image_url: new.image_url,
            category_id: new.category_id,
            created_by: new.created_by,
            created_time: now,
            last_modified: now,
            is_active: true,
        };
        tables.listings.push(listing.clone());
        Ok(listing)
    }

    async fn get_listing(&self, listing_id: i64) -> Result<Listing> {
        self.tables.lock().await.listing(listing_id).cloned()
    }

    async fn list_listings(&self, filter: ListingFilter) -> Result<Vec<Listing>> {
        let tables = self.tables.lock().await;
        if let ListingFilter::ActiveInCategory(category_id) = filter {
            tables.category(category_id)?;
        }
        let listings = tables
            .listings
            .iter()
            .rev()
            .filter(|l| match filter {
                ListingFilter::Active => l.is_active,
                ListingFilter::CreatedBy(user_id) => l.created_by == user_id,
                ListingFilter::BidOnBy(user_id) => tables
                    .bids
                    .iter()
                    .any(|b| b.listing_id == l.id && b.bidder_id == user_id),
                ListingFilter::WatchedBy(user_id) => tables.watchlist.contains(&(l.id, user_id)),
                ListingFilter::ActiveInCategory(category_id) => {
                    l.is_active && l.category_id == Some(category_id)
                }
            })
            .cloned()
            .collect();
        Ok(listings)
    }

    async fn current_bid(&self, listing_id: i64) -> Result<Option<Bid>> {
        let tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        Ok(tables.current_bid(listing_id).cloned())
    }

    async fn bids_for_listing(&self, listing_id: i64) -> Result<Vec<Bid>> {
        let tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        Ok(tables
            .bids
            .iter()
            .rev()
            .filter(|b| b.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn place_bid(
        &self,
        listing_id: i64,
        bidder_id: i64,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Bid> {
        let mut tables = self.tables.lock().await;
        let listing = tables.listing(listing_id)?;
        tables.user(bidder_id)?;
        rules::check_bid(listing, tables.current_bid(listing_id), price)?;

        let bid = Bid {
            id: Tables::next_id(tables.bids.len()),
            bidder_id,
            listing_id,
            price,
            time: now,
        };
        tables.bids.push(bid.clone());
        debug!("{:<12} --> bid {} stored for listing {}", "Store", bid.id, listing_id);
        Ok(bid)
    }

    async fn close_listing(
        &self,
        listing_id: i64,
        requester_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Listing> {
        let mut tables = self.tables.lock().await;
        let listing = tables.listing_mut(listing_id)?;
        match rules::check_close(listing, requester_id)? {
            CloseOutcome::Closed => {
                listing.is_active = false;
                listing.last_modified = now;
                info!("{:<12} --> listing {} closed", "Store", listing_id);
            }
            CloseOutcome::AlreadyClosed => {
                debug!("{:<12} --> listing {} already closed", "Store", listing_id);
            }
        }
        Ok(listing.clone())
    }

    async fn set_watching(&self, listing_id: i64, user_id: i64, watching: bool) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        tables.user(user_id)?;
        if watching {
            tables.watchlist.insert((listing_id, user_id));
        } else {
            tables.watchlist.remove(&(listing_id, user_id));
        }
        Ok(())
    }

    async fn watchers(&self, listing_id: i64) -> Result<Vec<i64>> {
        let tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        Ok(tables
            .watchlist
            .iter()
            .filter(|(l, _)| *l == listing_id)
            .map(|(_, user_id)| *user_id)
            .collect())
    }

    async fn add_comment(
        &self,
        listing_id: i64,
        author_id: i64,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment> {
        let mut tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        tables.user(author_id)?;
        let comment = Comment {
            id: Tables::next_id(tables.comments.len()),
            created_by: author_id,
            listing_id,
            text: text.to_string(),
            created_time: now,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn comments_for_listing(&self, listing_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.lock().await;
        tables.listing(listing_id)?;
        Ok(tables
            .comments
            .iter()
            .filter(|c| c.listing_id == listing_id)
            .cloned()
            .collect())
    }

    async fn category_counts(&self) -> Result<Vec<CategoryCount>> {
        let tables = self.tables.lock().await;
        let mut counts: Vec<CategoryCount> = tables
            .categories
            .iter()
            .map(|c| CategoryCount {
                id: c.id,
                name: c.name.clone(),
                active_count: tables
                    .listings
                    .iter()
                    .filter(|l| l.is_active && l.category_id == Some(c.id))
                    .count() as i64,
            })
            .collect();
        counts.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(counts)
    }
}

// endregion: --- Memory Ledger Store
