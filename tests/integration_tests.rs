use auction_ledger::handlers::USER_HEADER;
use auction_ledger::routes;
use auction_ledger::store::{MemoryLedgerStore, SharedStore};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Starts the router on an ephemeral port and returns its base URL.
async fn spawn_app() -> String {
    let store: SharedStore = Arc::new(MemoryLedgerStore::new());
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, routes::router(store).into_make_service())
            .await
            .unwrap();
    });
    format!("http://{addr}")
}

async fn create_user(client: &Client, base: &str, username: &str) -> i64 {
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({ "username": username }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
}

async fn create_listing(
    client: &Client,
    base: &str,
    owner: i64,
    starting_bid: &str,
    category_id: Option<i64>,
) -> i64 {
    let response = client
        .post(format!("{base}/listings"))
        .header(USER_HEADER, owner.to_string())
        .json(&json!({
            "title": "Test listing",
            "description": "Listing created by an integration test",
            "starting_bid": starting_bid,
            "category_id": category_id,
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json::<Value>().await.unwrap()["id"].as_i64().unwrap()
}

async fn bid(client: &Client, base: &str, listing: i64, bidder: i64, price: &str) -> StatusCode {
    client
        .post(format!("{base}/listings/{listing}/bids"))
        .header(USER_HEADER, bidder.to_string())
        .json(&json!({ "price": price }))
        .send()
        .await
        .expect("Failed to send request")
        .status()
}

/// Bidding from a 10.00 starting bid
#[tokio::test]
async fn test_bid_sequence() {
    let base = spawn_app().await;
    let client = Client::new();
    let seller = create_user(&client, &base, "seller").await;
    let bidder = create_user(&client, &base, "bidder").await;
    let listing = create_listing(&client, &base, seller, "10.00", None).await;

    assert_eq!(bid(&client, &base, listing, bidder, "10.00").await, StatusCode::BAD_REQUEST);
    assert_eq!(bid(&client, &base, listing, bidder, "10.01").await, StatusCode::CREATED);
    assert_eq!(bid(&client, &base, listing, bidder, "10.01").await, StatusCode::BAD_REQUEST);
    assert_eq!(bid(&client, &base, listing, bidder, "15.00").await, StatusCode::CREATED);

    let detail: Value = client
        .get(format!("{base}/listings/{listing}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["current_bid"]["price"], "15.00");
    assert_eq!(detail["current_bid"]["bidder_id"], bidder);
    assert_eq!(detail["winner_id"], Value::Null);

    let history: Value = client
        .get(format!("{base}/listings/{listing}/bids"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["price"], "15.00");
}

/// Invalid bids report their reason
#[tokio::test]
async fn test_invalid_bid_body() {
    let base = spawn_app().await;
    let client = Client::new();
    let seller = create_user(&client, &base, "seller").await;
    let listing = create_listing(&client, &base, seller, "5.00", None).await;

    let response = client
        .post(format!("{base}/listings/{listing}/bids"))
        .header(USER_HEADER, seller.to_string())
        .json(&json!({ "price": "4.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_BID");
}

/// Unparseable bodies and paths get the JSON error body
#[tokio::test]
async fn test_malformed_requests() {
    let base = spawn_app().await;
    let client = Client::new();
    let seller = create_user(&client, &base, "seller").await;
    let listing = create_listing(&client, &base, seller, "5.00", None).await;

    let bad_price = client
        .post(format!("{base}/listings/{listing}/bids"))
        .header(USER_HEADER, seller.to_string())
        .json(&json!({ "price": "abc" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_price.status(), StatusCode::BAD_REQUEST);
    let body: Value = bad_price.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
    assert!(body["error"].as_str().unwrap().contains("price"));

    let bad_id = client
        .get(format!("{base}/listings/abc"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    let body: Value = bad_id.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");

    let not_json = client
        .post(format!("{base}/users"))
        .header("content-type", "application/json")
        .body("{")
        .send()
        .await
        .unwrap();
    assert_eq!(not_json.status(), StatusCode::BAD_REQUEST);
    let body: Value = not_json.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_INPUT");
}

/// Closing and winning
#[tokio::test]
async fn test_close_lifecycle() {
    let base = spawn_app().await;
    let client = Client::new();
    let owner = create_user(&client, &base, "owner").await;
    let other = create_user(&client, &base, "other").await;
    let listing = create_listing(&client, &base, owner, "1.00", None).await;
    assert_eq!(bid(&client, &base, listing, other, "2.50").await, StatusCode::CREATED);

    let closed = client
        .post(format!("{base}/listings/{listing}/close"))
        .header(USER_HEADER, owner.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(closed.status(), StatusCode::OK);
    assert_eq!(closed.json::<Value>().await.unwrap()["is_active"], false);

    let denied = client
        .post(format!("{base}/listings/{listing}/close"))
        .header(USER_HEADER, other.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let reclosed = client
        .post(format!("{base}/listings/{listing}/close"))
        .header(USER_HEADER, owner.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(reclosed.status(), StatusCode::OK);
    assert_eq!(reclosed.json::<Value>().await.unwrap()["is_active"], false);

    assert_eq!(bid(&client, &base, listing, other, "9.00").await, StatusCode::BAD_REQUEST);

    let winner: Value = client
        .get(format!("{base}/listings/{listing}/winner"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(winner["username"], "other");

    let seen_by_winner: Value = client
        .get(format!("{base}/listings/{listing}"))
        .header(USER_HEADER, other.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(seen_by_winner["viewer_has_won"], true);

    let active: Value = client
        .get(format!("{base}/listings"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(active.as_array().unwrap().is_empty());
}

/// Watchlist round trip
#[tokio::test]
async fn test_watchlist() {
    let base = spawn_app().await;
    let client = Client::new();
    let owner = create_user(&client, &base, "owner").await;
    let watcher = create_user(&client, &base, "watcher").await;
    let listing = create_listing(&client, &base, owner, "1.00", None).await;

    for _ in 0..2 {
        let response = client
            .put(format!("{base}/listings/{listing}/watch"))
            .header(USER_HEADER, watcher.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let watchlist: Value = client
        .get(format!("{base}/me/watchlist"))
        .header(USER_HEADER, watcher.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(watchlist.as_array().unwrap().len(), 1);

    for _ in 0..2 {
        let response = client
            .delete(format!("{base}/listings/{listing}/watch"))
            .header(USER_HEADER, watcher.to_string())
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    let watchlist: Value = client
        .get(format!("{base}/me/watchlist"))
        .header(USER_HEADER, watcher.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(watchlist.as_array().unwrap().is_empty());
}

/// Category counts keep empty categories
#[tokio::test]
async fn test_category_counts() {
    let base = spawn_app().await;
    let client = Client::new();
    let owner = create_user(&client, &base, "owner").await;

    let mut category_ids = Vec::new();
    for name in ["Antiques", "Books"] {
        let response = client
            .post(format!("{base}/categories"))
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        category_ids.push(response.json::<Value>().await.unwrap()["id"].as_i64().unwrap());
    }
    create_listing(&client, &base, owner, "3.00", Some(category_ids[1])).await;

    let counts: Value = client
        .get(format!("{base}/categories"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        counts,
        json!([
            { "id": category_ids[0], "name": "Antiques", "active_count": 0 },
            { "id": category_ids[1], "name": "Books", "active_count": 1 },
        ])
    );

    let missing = client
        .get(format!("{base}/categories/999/listings"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

/// Comments, users and authentication
#[tokio::test]
async fn test_comments_and_auth() {
    let base = spawn_app().await;
    let client = Client::new();
    let owner = create_user(&client, &base, "owner").await;
    let listing = create_listing(&client, &base, owner, "1.00", None).await;

    let anonymous = client
        .post(format!("{base}/listings/{listing}/comments"))
        .json(&json!({ "text": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let empty = client
        .post(format!("{base}/listings/{listing}/comments"))
        .header(USER_HEADER, owner.to_string())
        .json(&json!({ "text": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::CREATED);

    let comments: Value = client
        .get(format!("{base}/listings/{listing}/comments"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(comments.as_array().unwrap().len(), 1);

    let taken = client
        .post(format!("{base}/users"))
        .json(&json!({ "username": "owner" }))
        .send()
        .await
        .unwrap();
    assert_eq!(taken.status(), StatusCode::CONFLICT);

    let unknown = client
        .get(format!("{base}/listings/404"))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

/// Concurrent bids at the same price
#[tokio::test]
async fn test_concurrent_bidding() {
    let base = spawn_app().await;
    let client = Client::new();
    let owner = create_user(&client, &base, "owner").await;
    let listing = create_listing(&client, &base, owner, "10.00", None).await;

    let mut bidders = Vec::new();
    for i in 1..=20 {
        bidders.push(create_user(&client, &base, &format!("bidder-{i}")).await);
    }

    let mut handles = vec![];
    for bidder in bidders {
        let client = client.clone();
        let base = base.clone();
        handles.push(tokio::spawn(async move {
            bid(&client, &base, listing, bidder, "20.00").await
        }));
    }

    let mut successful_bids = 0;
    let mut failed_bids = 0;
    for handle in handles {
        let status = handle.await.unwrap();
        if status == StatusCode::CREATED {
            successful_bids += 1;
        } else if status == StatusCode::BAD_REQUEST {
            failed_bids += 1;
        } else {
            panic!("unexpected status {status}");
        }
    }
    assert_eq!(successful_bids, 1);
    assert_eq!(failed_bids, 19);

    let my_bids: Value = client
        .get(format!("{base}/me/bids"))
        .header(USER_HEADER, owner.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(my_bids.as_array().unwrap().is_empty());
}
