// region:    --- Users
pub const INSERT_USER: &str = r#"
    INSERT INTO users (username, email, created_at)
    VALUES ($1, $2, $3)
    RETURNING id, username, email, created_at
"#;

pub const GET_USER: &str = "SELECT id, username, email, created_at FROM users WHERE id = $1";

pub const USER_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)";

// endregion: --- Users

// region:    --- Categories
pub const INSERT_CATEGORY: &str = "INSERT INTO categories (name) VALUES ($1) RETURNING id, name";

pub const GET_CATEGORY: &str = "SELECT id, name FROM categories WHERE id = $1";

/// Holds the category until commit so it cannot be deleted under a new listing.
pub const LOCK_CATEGORY: &str = "SELECT id, name FROM categories WHERE id = $1 FOR SHARE";

/// One grouped query; the LEFT JOIN keeps categories with no active listings.
pub const GET_CATEGORY_COUNTS: &str = r#"
    SELECT c.id, c.name, COUNT(l.id) AS active_count
    FROM categories c
    LEFT JOIN listings l ON l.category_id = c.id AND l.is_active
    GROUP BY c.id, c.name
    ORDER BY c.name, c.id
"#;

// endregion: --- Categories

// region:    --- Listings
const LISTING_COLUMNS: &str = "l.id, l.title, l.description, l.starting_bid, l.image_url, l.category_id, l.created_by, l.created_time, l.last_modified, l.is_active";

pub const INSERT_LISTING: &str = r#"
    INSERT INTO listings (title, description, starting_bid, image_url, category_id, created_by, created_time, last_modified, is_active)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $7, TRUE)
    RETURNING id, title, description, starting_bid, image_url, category_id, created_by, created_time, last_modified, is_active
"#;

pub const GET_LISTING: &str = "SELECT id, title, description, starting_bid, image_url, category_id, created_by, created_time, last_modified, is_active FROM listings WHERE id = $1";

pub const LISTING_EXISTS: &str = "SELECT EXISTS (SELECT 1 FROM listings WHERE id = $1)";

/// Row lock held for the rest of the bid or close transaction.
pub const LOCK_LISTING: &str = "SELECT id, title, description, starting_bid, image_url, category_id, created_by, created_time, last_modified, is_active FROM listings WHERE id = $1 FOR UPDATE";

pub const CLOSE_LISTING: &str = r#"
    UPDATE listings SET is_active = FALSE, last_modified = $2
    WHERE id = $1
    RETURNING id, title, description, starting_bid, image_url, category_id, created_by, created_time, last_modified, is_active
"#;

/// Listing selection for each [`crate::auction::model::ListingFilter`].
pub fn listings_query(filter: crate::auction::model::ListingFilter) -> String {
    use crate::auction::model::ListingFilter;

    let predicate = match filter {
        ListingFilter::Active => "l.is_active",
        ListingFilter::CreatedBy(_) => "l.created_by = $1",
        ListingFilter::BidOnBy(_) => {
            "EXISTS (SELECT 1 FROM bids b WHERE b.listing_id = l.id AND b.bidder_id = $1)"
        }
        ListingFilter::WatchedBy(_) => {
            "EXISTS (SELECT 1 FROM watchlist w WHERE w.listing_id = l.id AND w.user_id = $1)"
        }
        ListingFilter::ActiveInCategory(_) => "l.is_active AND l.category_id = $1",
    };
    format!(
        "SELECT {LISTING_COLUMNS} FROM listings l WHERE {predicate} ORDER BY l.created_time DESC, l.id DESC"
    )
}

// endregion: --- Listings

// region:    --- Bids
/// Highest bid; ties fall to the earliest row.
pub const GET_CURRENT_BID: &str = r#"
    SELECT id, bidder_id, listing_id, price, time
    FROM bids
    WHERE listing_id = $1
    ORDER BY price DESC, id ASC
    LIMIT 1
"#;

/// Newest first.
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, bidder_id, listing_id, price, time
    FROM bids
    WHERE listing_id = $1
    ORDER BY time DESC, id DESC
"#;

pub const INSERT_BID: &str = r#"
    INSERT INTO bids (bidder_id, listing_id, price, time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, bidder_id, listing_id, price, time
"#;

// endregion: --- Bids

// region:    --- Watchlist
pub const WATCH_LISTING: &str =
    "INSERT INTO watchlist (listing_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING";

pub const UNWATCH_LISTING: &str = "DELETE FROM watchlist WHERE listing_id = $1 AND user_id = $2";

pub const GET_WATCHERS: &str =
    "SELECT user_id FROM watchlist WHERE listing_id = $1 ORDER BY user_id";

// endregion: --- Watchlist

// region:    --- Comments
pub const INSERT_COMMENT: &str = r#"
    INSERT INTO comments (created_by, listing_id, text, created_time)
    VALUES ($1, $2, $3, $4)
    RETURNING id, created_by, listing_id, text, created_time
"#;

pub const GET_COMMENTS: &str = r#"
    SELECT id, created_by, listing_id, text, created_time
    FROM comments
    WHERE listing_id = $1
    ORDER BY created_time ASC, id ASC
"#;

// endregion: --- Comments

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::ListingFilter;

    #[test]
    fn active_filter_takes_no_parameter() {
        let sql = listings_query(ListingFilter::Active);
        assert!(sql.contains("WHERE l.is_active ORDER BY"));
        assert!(!sql.contains("$1"));
    }

    #[test]
    fn user_filters_bind_one_parameter() {
        for filter in [
            ListingFilter::CreatedBy(1),
            ListingFilter::BidOnBy(1),
            ListingFilter::WatchedBy(1),
            ListingFilter::ActiveInCategory(1),
        ] {
            assert_eq!(listings_query(filter).matches("$1").count(), 1);
        }
    }

    #[test]
    fn row_locks_block_concurrent_changes() {
        assert!(LOCK_LISTING.trim_end().ends_with("FOR UPDATE"));
        assert!(LOCK_CATEGORY.ends_with("FOR SHARE"));
    }
}
