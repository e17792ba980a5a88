// region:    --- Imports
use crate::auction::model::{
    Bid, CategoryCount, Comment, Listing, ListingDetail, ListingFilter, User,
};
use crate::auction::rules;
use crate::error::Result;
use crate::store::LedgerStore;
use tracing::info;

// endregion: --- Imports

// region:    --- Query Handlers

/// Highest bid on the listing.
pub async fn get_current_bid<S>(store: &S, listing_id: i64) -> Result<Option<Bid>>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> current bid id: {}", "Query", listing_id);
    store.current_bid(listing_id).await
}

/// Winning user of a closed listing, `None` while active or without bids.
pub async fn get_winner<S>(store: &S, listing_id: i64) -> Result<Option<User>>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> winner id: {}", "Query", listing_id);
    let listing = store.get_listing(listing_id).await?;
    let current = store.current_bid(listing_id).await?;
    match rules::winner_of(&listing, current.as_ref()) {
        Some(user_id) => Ok(Some(store.get_user(user_id).await?)),
        None => Ok(None),
    }
}

/// Listing page, seen by `viewer` when one is known.
pub async fn get_listing_detail<S>(
    store: &S,
    listing_id: i64,
    viewer: Option<i64>,
) -> Result<ListingDetail>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> listing detail id: {}", "Query", listing_id);
    let listing = store.get_listing(listing_id).await?;
    let current_bid = store.current_bid(listing_id).await?;
    let watchers = store.watchers(listing_id).await?;
    let comments = store.comments_for_listing(listing_id).await?;
    let winner_id = rules::winner_of(&listing, current_bid.as_ref());

    Ok(ListingDetail {
        viewer_is_watching: viewer.is_some_and(|v| watchers.contains(&v)),
        viewer_has_won: viewer.is_some() && viewer == winner_id,
        watcher_count: watchers.len(),
        winner_id,
        current_bid,
        comments,
        listing,
    })
}

pub async fn get_category_counts<S>(store: &S) -> Result<Vec<CategoryCount>>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> category counts", "Query");
    store.category_counts().await
}

pub async fn get_listings<S>(store: &S, filter: ListingFilter) -> Result<Vec<Listing>>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> listings {:?}", "Query", filter);
    store.list_listings(filter).await
}

/// Newest bid first.
pub async fn get_bid_history<S>(store: &S, listing_id: i64) -> Result<Vec<Bid>>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> bid history id: {}", "Query", listing_id);
    store.bids_for_listing(listing_id).await
}

pub async fn get_comments<S>(store: &S, listing_id: i64) -> Result<Vec<Comment>>
where
    S: LedgerStore + ?Sized,
{
    store.comments_for_listing(listing_id).await
}

pub async fn get_user<S>(store: &S, user_id: i64) -> Result<User>
where
    S: LedgerStore + ?Sized,
{
    store.get_user(user_id).await
}

// endregion: --- Query Handlers
