use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// User model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

// Listing model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub starting_bid: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub created_by: i64,
    pub created_time: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub is_active: bool,
}

/// Validated input for a new listing.
#[derive(Debug, Clone)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub starting_bid: Decimal,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub created_by: i64,
}

// Bid model. Never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub bidder_id: i64,
    pub listing_id: i64,
    pub price: Decimal,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub created_by: i64,
    pub listing_id: i64,
    pub text: String,
    pub created_time: DateTime<Utc>,
}

/// A category together with how many active listings reference it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub id: i64,
    pub name: String,
    pub active_count: i64,
}

/// Which listings a listing query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingFilter {
    Active,
    CreatedBy(i64),
    /// Listings the user has placed at least one bid on, without duplicates.
    BidOnBy(i64),
    WatchedBy(i64),
    ActiveInCategory(i64),
}

/// Everything the listing page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ListingDetail {
    pub listing: Listing,
    pub current_bid: Option<Bid>,
    pub winner_id: Option<i64>,
    pub watcher_count: usize,
    pub viewer_is_watching: bool,
    pub viewer_has_won: bool,
    pub comments: Vec<Comment>,
}
