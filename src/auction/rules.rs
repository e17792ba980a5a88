//! Auction rules shared by every store
//! 1. Bid validity
//! 2. Closing a listing
//! 3. Winner
//! 4. Amount format
// region:    --- Imports
use super::model::{Bid, Listing};
use crate::error::{BidRejection, LedgerError};
use rust_decimal::Decimal;

// endregion: --- Imports

/// Largest amount a NUMERIC(9, 2) column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// Fractional digits kept for prices.
pub const AMOUNT_SCALE: u32 = 2;

/// Outcome of an accepted close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    AlreadyClosed,
}

// region:    --- Rules

/// 1. A bid must beat both the starting bid and the current bid of an open listing.
pub fn check_bid(
    listing: &Listing,
    current: Option<&Bid>,
    price: Decimal,
) -> Result<(), BidRejection> {
    if !listing.is_active {
        return Err(BidRejection::ListingClosed);
    }
    if price <= listing.starting_bid {
        return Err(BidRejection::NotAboveStartingBid {
            starting_bid: listing.starting_bid,
        });
    }
    if let Some(current) = current {
        if price <= current.price {
            return Err(BidRejection::NotAboveCurrentBid {
                current: current.price,
            });
        }
    }
    Ok(())
}

/// 2. Only the creator may close; closing twice is a no-op.
pub fn check_close(listing: &Listing, requester_id: i64) -> Result<CloseOutcome, LedgerError> {
    if listing.created_by != requester_id {
        return Err(LedgerError::PermissionDenied);
    }
    if listing.is_active {
        Ok(CloseOutcome::Closed)
    } else {
        Ok(CloseOutcome::AlreadyClosed)
    }
}

/// 3. Bidder of the current bid, once the listing is closed.
pub fn winner_of(listing: &Listing, current: Option<&Bid>) -> Option<i64> {
    if listing.is_active {
        return None;
    }
    current.map(|bid| bid.bidder_id)
}

/// 4. Non-negative, at most two decimals, fits NUMERIC(9, 2).
pub fn check_amount(field: &str, amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidInput(format!(
            "{field} must not be negative"
        )));
    }
    let normalized = amount.normalize();
    if normalized.scale() > AMOUNT_SCALE {
        return Err(LedgerError::InvalidInput(format!(
            "{field} allows at most {AMOUNT_SCALE} decimal places"
        )));
    }
    if normalized > MAX_AMOUNT {
        return Err(LedgerError::InvalidInput(format!(
            "{field} must not exceed {MAX_AMOUNT}"
        )));
    }
    let mut rescaled = normalized;
    rescaled.rescale(AMOUNT_SCALE);
    Ok(rescaled)
}

// endregion: --- Rules

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn price(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn listing(starting_bid: &str, is_active: bool) -> Listing {
        Listing {
            id: 1,
            title: "Lamp".into(),
            description: "Brass desk lamp".into(),
            starting_bid: price(starting_bid),
            image_url: None,
            category_id: None,
            created_by: 10,
            created_time: Utc::now(),
            last_modified: Utc::now(),
            is_active,
        }
    }

    fn bid(bidder_id: i64, amount: &str) -> Bid {
        Bid {
            id: 1,
            bidder_id,
            listing_id: 1,
            price: price(amount),
            time: Utc::now(),
        }
    }

    #[test]
    fn bid_must_exceed_starting_bid() {
        let listing = listing("10.00", true);
        assert_eq!(
            check_bid(&listing, None, price("10.00")),
            Err(BidRejection::NotAboveStartingBid {
                starting_bid: price("10.00")
            })
        );
        assert_eq!(check_bid(&listing, None, price("10.01")), Ok(()));
    }

    #[test]
    fn bid_must_exceed_current_bid() {
        let listing = listing("10.00", true);
        let current = bid(20, "10.01");
        assert!(matches!(
            check_bid(&listing, Some(&current), price("10.01")),
            Err(BidRejection::NotAboveCurrentBid { .. })
        ));
        assert_eq!(check_bid(&listing, Some(&current), price("15.00")), Ok(()));
    }

    #[test]
    fn closed_listing_rejects_any_bid() {
        let listing = listing("10.00", false);
        assert_eq!(
            check_bid(&listing, None, price("1000.00")),
            Err(BidRejection::ListingClosed)
        );
    }

    #[test]
    fn only_creator_can_close() {
        let open = listing("1.00", true);
        assert!(matches!(
            check_close(&open, 99),
            Err(LedgerError::PermissionDenied)
        ));
        assert_eq!(check_close(&open, 10).unwrap(), CloseOutcome::Closed);

        let closed = listing("1.00", false);
        assert_eq!(check_close(&closed, 10).unwrap(), CloseOutcome::AlreadyClosed);
        assert!(matches!(
            check_close(&closed, 99),
            Err(LedgerError::PermissionDenied)
        ));
    }

    #[test]
    fn winner_requires_closed_listing_with_bid() {
        let top = bid(42, "12.00");
        assert_eq!(winner_of(&listing("1.00", true), Some(&top)), None);
        assert_eq!(winner_of(&listing("1.00", false), None), None);
        assert_eq!(winner_of(&listing("1.00", false), Some(&top)), Some(42));
    }

    #[test]
    fn amount_format() {
        assert_eq!(check_amount("price", price("10.5")).unwrap().to_string(), "10.50");
        assert_eq!(check_amount("price", price("0")).unwrap().to_string(), "0.00");
        assert_eq!(check_amount("price", price("3.100")).unwrap().to_string(), "3.10");
        assert!(check_amount("price", price("-1")).is_err());
        assert!(check_amount("price", price("1.001")).is_err());
        assert!(check_amount("price", price("9999999.99")).is_ok());
        assert!(check_amount("price", price("10000000")).is_err());
    }
}
