//! Ledger commands
//! 1. Register user / create category
//! 2. Create listing
//! 3. Place bid
//! 4. Close listing
//! 5. Watch / unwatch
//! 6. Comment
// region:    --- Imports
use crate::auction::model::{Bid, Category, Comment, Listing, NewListing, User};
use crate::auction::rules;
use crate::error::{LedgerError, Result};
use crate::store::LedgerStore;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RegisterUserCommand {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateListingCommand {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starting_bid: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
}

/// Bid on a listing.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub listing_id: i64,
    pub bidder_id: i64,
    pub price: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct CloseListingCommand {
    pub listing_id: i64,
    pub requester_id: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct WatchCommand {
    pub listing_id: i64,
    pub user_id: i64,
    pub watching: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AddCommentCommand {
    pub listing_id: i64,
    pub author_id: i64,
    #[serde(default)]
    pub text: String,
}

// endregion: --- Commands

// region:    --- Validation
fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::InvalidInput(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

fn image_url(value: Option<String>) -> Result<Option<String>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            Ok(Some(url.to_string()))
        }
        Some(_) => Err(LedgerError::InvalidInput(
            "image_url must be an http(s) URL".into(),
        )),
    }
}

// endregion: --- Validation

// region:    --- Command Handlers

/// 1. Usernames are unique; a blank email is dropped.
pub async fn handle_register_user<S>(cmd: RegisterUserCommand, store: &S) -> Result<User>
where
    S: LedgerStore + ?Sized,
{
    let username = required("username", &cmd.username)?;
    let email = cmd
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    let user = store
        .create_user(&username, email.as_deref(), Utc::now())
        .await?;
    info!("{:<12} --> user {} registered", "Command", user.id);
    Ok(user)
}

pub async fn handle_create_category<S>(cmd: CreateCategoryCommand, store: &S) -> Result<Category>
where
    S: LedgerStore + ?Sized,
{
    let name = required("name", &cmd.name)?;
    store.create_category(&name).await
}

/// 2. New listings always start active.
pub async fn handle_create_listing<S>(
    cmd: CreateListingCommand,
    created_by: i64,
    store: &S,
) -> Result<Listing>
where
    S: LedgerStore + ?Sized,
{
    let new = NewListing {
        title: required("title", &cmd.title)?,
        description: cmd.description,
        starting_bid: rules::check_amount("starting_bid", cmd.starting_bid)?,
        image_url: image_url(cmd.image_url)?,
        category_id: cmd.category_id,
        created_by,
    };
    let listing = store.create_listing(new, Utc::now()).await?;
    info!(
        "{:<12} --> listing {} created by user {}",
        "Command", listing.id, created_by
    );
    Ok(listing)
}

/// 3. Bids are validated against the locked listing inside the store.
pub async fn handle_place_bid<S>(cmd: PlaceBidCommand, store: &S) -> Result<Bid>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> bid request: {:?}", "Command", cmd);
    let price = rules::check_amount("price", cmd.price)?;

    match store
        .place_bid(cmd.listing_id, cmd.bidder_id, price, Utc::now())
        .await
    {
        Ok(bid) => {
            info!(
                "{:<12} --> bid {} accepted at {} on listing {}",
                "Command", bid.id, bid.price, bid.listing_id
            );
            Ok(bid)
        }
        Err(LedgerError::InvalidBid(reason)) => {
            warn!(
                "{:<12} --> bid on listing {} rejected: {}",
                "Command", cmd.listing_id, reason
            );
            Err(LedgerError::InvalidBid(reason))
        }
        Err(e) => Err(e),
    }
}

/// 4. Only the creator may close; re-closing returns the listing unchanged.
pub async fn handle_close_listing<S>(cmd: CloseListingCommand, store: &S) -> Result<Listing>
where
    S: LedgerStore + ?Sized,
{
    info!("{:<12} --> close request: {:?}", "Command", cmd);
    let result = store
        .close_listing(cmd.listing_id, cmd.requester_id, Utc::now())
        .await;
    if let Err(LedgerError::PermissionDenied) = &result {
        warn!(
            "{:<12} --> user {} may not close listing {}",
            "Command", cmd.requester_id, cmd.listing_id
        );
    }
    result
}

/// 5. Idempotent in both directions.
pub async fn handle_watch<S>(cmd: WatchCommand, store: &S) -> Result<()>
where
    S: LedgerStore + ?Sized,
{
    store
        .set_watching(cmd.listing_id, cmd.user_id, cmd.watching)
        .await
}

/// 6. Text is stored as given, empty included.
pub async fn handle_add_comment<S>(cmd: AddCommentCommand, store: &S) -> Result<Comment>
where
    S: LedgerStore + ?Sized,
{
    store
        .add_comment(cmd.listing_id, cmd.author_id, &cmd.text, Utc::now())
        .await
}

// endregion: --- Command Handlers
