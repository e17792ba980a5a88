// region:    --- Imports
use crate::auction::model::ListingFilter;
use crate::bidding::commands::{
    handle_add_comment, handle_close_listing, handle_create_category, handle_create_listing,
    handle_place_bid, handle_register_user, handle_watch, AddCommentCommand, CloseListingCommand,
    CreateCategoryCommand, CreateListingCommand, PlaceBidCommand, RegisterUserCommand,
    WatchCommand,
};
use crate::error::{LedgerError, Result};
use crate::query;
use crate::store::SharedStore;
use axum::async_trait;
use axum::extract::{FromRequest, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

// endregion: --- Imports

// region:    --- Actor
/// Header carrying the id of the acting user.
pub const USER_HEADER: &str = "x-user-id";

/// The user a request acts for, read from [`USER_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = LedgerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i64>().ok())
            .map(Actor)
            .ok_or(LedgerError::Unauthenticated)
    }
}

// endregion: --- Actor

// region:    --- Extractors
/// `axum::Json` whose rejections are reported as [`LedgerError::InvalidInput`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(LedgerError))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` whose rejections are reported as [`LedgerError::InvalidInput`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(LedgerError))]
pub struct PathId<T>(pub T);

// endregion: --- Extractors

// region:    --- Bodies
#[derive(Debug, Deserialize)]
pub struct BidBody {
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    #[serde(default)]
    pub text: String,
}

// endregion: --- Bodies

// region:    --- Command Handlers

pub async fn handle_create_user(
    State(store): State<SharedStore>,
    JsonBody(cmd): JsonBody<RegisterUserCommand>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> register user {:?}", "Handler", cmd.username);
    let user = handle_register_user(cmd, &*store).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn handle_new_category(
    State(store): State<SharedStore>,
    JsonBody(cmd): JsonBody<CreateCategoryCommand>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> create category {:?}", "Handler", cmd.name);
    let category = handle_create_category(cmd, &*store).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn handle_new_listing(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
    JsonBody(cmd): JsonBody<CreateListingCommand>,
) -> Result<impl IntoResponse> {
    info!("{:<12} --> create listing by user {}", "Handler", user_id);
    let listing = handle_create_listing(cmd, user_id, &*store).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// Bid on a listing; 400 when the bid does not beat the listing's price.
pub async fn handle_bid(
    State(store): State<SharedStore>,
    Actor(bidder_id): Actor,
    PathId(listing_id): PathId<i64>,
    JsonBody(body): JsonBody<BidBody>,
) -> Result<impl IntoResponse> {
    let cmd = PlaceBidCommand {
        listing_id,
        bidder_id,
        price: body.price,
    };
    let bid = handle_place_bid(cmd, &*store).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

pub async fn handle_close(
    State(store): State<SharedStore>,
    Actor(requester_id): Actor,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    let cmd = CloseListingCommand {
        listing_id,
        requester_id,
    };
    let listing = handle_close_listing(cmd, &*store).await?;
    Ok(Json(listing))
}

pub async fn handle_watch_listing(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    let cmd = WatchCommand {
        listing_id,
        user_id,
        watching: true,
    };
    handle_watch(cmd, &*store).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_unwatch_listing(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    let cmd = WatchCommand {
        listing_id,
        user_id,
        watching: false,
    };
    handle_watch(cmd, &*store).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn handle_comment(
    State(store): State<SharedStore>,
    Actor(author_id): Actor,
    PathId(listing_id): PathId<i64>,
    JsonBody(body): JsonBody<CommentBody>,
) -> Result<impl IntoResponse> {
    let cmd = AddCommentCommand {
        listing_id,
        author_id,
        text: body.text,
    };
    let comment = handle_add_comment(cmd, &*store).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

pub async fn handle_get_user(
    State(store): State<SharedStore>,
    PathId(user_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(query::handlers::get_user(&*store, user_id).await?))
}

pub async fn handle_get_categories(State(store): State<SharedStore>) -> Result<impl IntoResponse> {
    Ok(Json(query::handlers::get_category_counts(&*store).await?))
}

pub async fn handle_get_category_listings(
    State(store): State<SharedStore>,
    PathId(category_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    let filter = ListingFilter::ActiveInCategory(category_id);
    Ok(Json(query::handlers::get_listings(&*store, filter).await?))
}

pub async fn handle_get_active_listings(
    State(store): State<SharedStore>,
) -> Result<impl IntoResponse> {
    let filter = ListingFilter::Active;
    Ok(Json(query::handlers::get_listings(&*store, filter).await?))
}

pub async fn handle_get_listing(
    State(store): State<SharedStore>,
    viewer: Option<Actor>,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    let viewer = viewer.map(|Actor(id)| id);
    Ok(Json(
        query::handlers::get_listing_detail(&*store, listing_id, viewer).await?,
    ))
}

pub async fn handle_get_bid_history(
    State(store): State<SharedStore>,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(
        query::handlers::get_bid_history(&*store, listing_id).await?,
    ))
}

pub async fn handle_get_winner(
    State(store): State<SharedStore>,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(query::handlers::get_winner(&*store, listing_id).await?))
}

pub async fn handle_get_comments(
    State(store): State<SharedStore>,
    PathId(listing_id): PathId<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(query::handlers::get_comments(&*store, listing_id).await?))
}

pub async fn handle_my_listings(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
) -> Result<impl IntoResponse> {
    let filter = ListingFilter::CreatedBy(user_id);
    Ok(Json(query::handlers::get_listings(&*store, filter).await?))
}

pub async fn handle_my_bids(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
) -> Result<impl IntoResponse> {
    let filter = ListingFilter::BidOnBy(user_id);
    Ok(Json(query::handlers::get_listings(&*store, filter).await?))
}

pub async fn handle_my_watchlist(
    State(store): State<SharedStore>,
    Actor(user_id): Actor,
) -> Result<impl IntoResponse> {
    let filter = ListingFilter::WatchedBy(user_id);
    Ok(Json(query::handlers::get_listings(&*store, filter).await?))
}

// endregion: --- Query Handlers
