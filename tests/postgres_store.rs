//! Runs against a live database: `DATABASE_URL=... cargo test -- --ignored`
use auction_ledger::auction::model::NewListing;
use auction_ledger::database::DatabaseManager;
use auction_ledger::error::LedgerError;
use auction_ledger::store::{LedgerStore, PostgresLedgerStore};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;

async fn connect() -> Arc<DatabaseManager> {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db_manager = DatabaseManager::connect(&database_url, 10)
        .await
        .expect("Failed to create pool");
    db_manager
        .initialize_database(false)
        .await
        .expect("Failed to create schema");
    Arc::new(db_manager)
}

async fn setup() -> Arc<PostgresLedgerStore> {
    Arc::new(PostgresLedgerStore::new(connect().await))
}

fn new_listing(created_by: i64, category_id: Option<i64>) -> NewListing {
    NewListing {
        title: "Row lock".into(),
        description: String::new(),
        starting_bid: Decimal::new(1000, 2),
        image_url: None,
        category_id,
        created_by,
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_bidding_locks_listing() {
    let store = setup().await;
    let seller = store
        .create_user(&unique("seller"), None, Utc::now())
        .await
        .unwrap();
    let listing = store
        .create_listing(new_listing(seller.id, None), Utc::now())
        .await
        .unwrap();

    let mut handles = vec![];
    for i in 0..10 {
        let store = Arc::clone(&store);
        let username = unique(&format!("bidder{i}"));
        handles.push(tokio::spawn(async move {
            let bidder = store.create_user(&username, None, Utc::now()).await.unwrap();
            store
                .place_bid(listing.id, bidder.id, Decimal::new(2000, 2), Utc::now())
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(LedgerError::InvalidBid(_)) => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(accepted, 1);

    let current = store.current_bid(listing.id).await.unwrap().unwrap();
    assert_eq!(current.price, Decimal::new(2000, 2));

    let denied = store.close_listing(listing.id, current.bidder_id, Utc::now()).await;
    assert!(matches!(denied, Err(LedgerError::PermissionDenied)));
    let closed = store
        .close_listing(listing.id, seller.id, Utc::now())
        .await
        .unwrap();
    assert!(!closed.is_active);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_counts_include_empty() {
    let store = setup().await;
    let name = unique("empty");
    let category = store.create_category(&name).await.unwrap();
    let counts = store.category_counts().await.unwrap();
    let entry = counts.iter().find(|c| c.id == category.id).unwrap();
    assert_eq!(entry.active_count, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_transaction_returns_closure_error() {
    let db = connect().await;
    let result = db
        .transaction::<_, (), LedgerError>(|_tx| {
            Box::pin(async move { Err(LedgerError::InvalidInput("rejected".into())) })
        })
        .await;
    assert!(matches!(result, Err(LedgerError::InvalidInput(msg)) if msg == "rejected"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_listing_in_unknown_category_is_not_found() {
    let store = setup().await;
    let seller = store
        .create_user(&unique("seller"), None, Utc::now())
        .await
        .unwrap();

    let missing = store
        .create_listing(new_listing(seller.id, Some(i64::MAX)), Utc::now())
        .await;
    assert!(matches!(
        missing,
        Err(LedgerError::NotFound { entity: "category", .. })
    ));

    let category = store.create_category(&unique("lamps")).await.unwrap();
    let listing = store
        .create_listing(new_listing(seller.id, Some(category.id)), Utc::now())
        .await
        .unwrap();
    assert_eq!(listing.category_id, Some(category.id));
}
