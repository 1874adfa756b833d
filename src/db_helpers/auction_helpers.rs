use sqlx::{Row, Sqlite, SqlitePool};

use crate::data_formats::NewAuctionRequest;
use crate::errors::RequestError;
use crate::models::Auction;

/// Base listing query. `$1` is the id of the requesting user (or NULL for an
/// anonymous request) and only feeds the `watched` flag; each helper appends
/// its own WHERE clause starting at `$2`.
const AUCTION_QUERY: &str = r#"
    SELECT auctions.id           AS "id",
           title                 AS "title",
           description           AS "description",
           starting_bid          AS "starting_bid",
           current_bid           AS "current_bid",
           image                 AS "image",
           active                AS "active",
           auctions.created_at   AS "created_at",
           author_id             AS "author_id",
           buyer_id              AS "buyer_id",
           categories.name       AS "category_name",
           authors.username      AS "author_username",
           buyers.username       AS "buyer_username",
           (SELECT Count(*)
            FROM   watchers
            WHERE  watchers.auction_id = auctions.id) AS "watchers_count",
           EXISTS (SELECT 1
                   FROM   watchers
                   WHERE  watchers.auction_id = auctions.id
                      AND watchers.user_id = $1)      AS "watched"
    FROM   auctions
        JOIN categories
            ON categories.id = auctions.category_id
        JOIN users AS authors
            ON authors.id = auctions.author_id
        LEFT JOIN users AS buyers
            ON buyers.id = auctions.buyer_id
"#;

pub async fn list_active_auctions_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
) -> Result<Vec<Auction>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{AUCTION_QUERY} WHERE active = TRUE ORDER BY auctions.created_at DESC, auctions.id DESC");
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(viewer)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn list_auctions_by_category_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    category: &str,
) -> Result<Vec<Auction>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{AUCTION_QUERY} WHERE active = TRUE AND categories.name = $2 ORDER BY auctions.created_at DESC, auctions.id DESC");
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(viewer)
        .bind(category)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Escapes the LIKE metacharacters so a search query only matches its literal
/// occurrences in a title.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub async fn search_auctions_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    needle: &str,
) -> Result<Vec<Auction>, RequestError> {
    let mut tx = pool.begin().await?;
    // SQLite LIKE is case-insensitive for ASCII, which matches the
    // icontains semantics of the search route.
    let query = format!("{AUCTION_QUERY} WHERE active = TRUE AND title LIKE '%' || $2 || '%' ESCAPE '\\' ORDER BY auctions.created_at DESC, auctions.id DESC");
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(viewer)
        .bind(escape_like(needle))
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn list_watchlist_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Auction>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "{AUCTION_QUERY} WHERE auctions.id IN (SELECT auction_id FROM watchers WHERE user_id = $2) ORDER BY auctions.created_at DESC, auctions.id DESC"
    );
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn list_purchases_in_db(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<Auction>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "{AUCTION_QUERY} WHERE buyer_id = $2 ORDER BY auctions.created_at DESC, auctions.id DESC"
    );
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_auction_by_id_in_db(
    pool: &SqlitePool,
    viewer: Option<i64>,
    auction_id: i64,
) -> Result<Auction, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{AUCTION_QUERY} WHERE auctions.id = $2");
    let result = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(viewer)
        .bind(auction_id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    match result {
        Some(auction) => Ok(auction),
        None => Err(RequestError::NotFound("Auction not found")),
    }
}

pub async fn create_auction_in_db(
    pool: &SqlitePool,
    author_id: i64,
    NewAuctionRequest {
        title,
        description,
        starting_bid,
        image,
        category_id,
    }: NewAuctionRequest,
) -> Result<Auction, RequestError> {
    let mut tx = pool.begin().await?;

    let category = sqlx::query("SELECT id FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(&mut tx)
        .await?;
    if category.is_none() {
        return Err(RequestError::RunTimeError("Select a valid category."));
    }

    let row = sqlx::query(
        r#"
        INSERT INTO auctions (title, description, starting_bid, image, category_id, author_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(description)
    .bind(starting_bid)
    .bind(image)
    .bind(category_id)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;
    let auction_id: i64 = row.get("id");
    tx.commit().await?;

    get_auction_by_id_in_db(pool, Some(author_id), auction_id).await
}

/// Validates and records a bid in a single transaction so concurrent bids on
/// the same auction cannot interleave between the price check and the write.
pub async fn place_bid_in_db(
    pool: &SqlitePool,
    user_id: i64,
    auction_id: i64,
    amount: i64,
) -> Result<Auction, RequestError> {
    let mut tx = pool.begin().await?;

    let query = format!("{AUCTION_QUERY} WHERE auctions.id = $2");
    let auction = sqlx::query_as::<Sqlite, Auction>(&query)
        .bind(user_id)
        .bind(auction_id)
        .fetch_optional(&mut tx)
        .await?;
    let auction = match auction {
        Some(auction) => auction,
        None => return Err(RequestError::NotFound("Auction not found")),
    };

    if !auction.active {
        return Err(RequestError::RunTimeError("This auction is closed."));
    }
    if !auction.accepts_bid(amount) {
        return Err(RequestError::RunTimeError(
            "Your bid must be greater than current price.",
        ));
    }

    sqlx::query("INSERT INTO bids (auction_id, user_id, amount) VALUES ($1, $2, $3)")
        .bind(auction_id)
        .bind(user_id)
        .bind(amount)
        .execute(&mut tx)
        .await?;
    sqlx::query("UPDATE auctions SET current_bid = $1 WHERE id = $2")
        .bind(amount)
        .bind(auction_id)
        .execute(&mut tx)
        .await?;
    // Bidders follow the auctions they bid on.
    sqlx::query("INSERT OR IGNORE INTO watchers (auction_id, user_id) VALUES ($1, $2)")
        .bind(auction_id)
        .bind(user_id)
        .execute(&mut tx)
        .await?;
    tx.commit().await?;

    get_auction_by_id_in_db(pool, Some(user_id), auction_id).await
}

/// Closes an auction on behalf of its author. Returns the updated auction and
/// the winner's email address when a bid was placed.
pub async fn close_auction_in_db(
    pool: &SqlitePool,
    user_id: i64,
    auction_id: i64,
) -> Result<(Auction, Option<String>), RequestError> {
    let mut tx = pool.begin().await?;

    let listing = sqlx::query("SELECT author_id, active FROM auctions WHERE id = $1")
        .bind(auction_id)
        .fetch_optional(&mut tx)
        .await?;
    let listing = match listing {
        Some(row) => row,
        None => return Err(RequestError::NotFound("Auction not found")),
    };
    let author_id: i64 = listing.get("author_id");
    if author_id != user_id {
        return Err(RequestError::Forbidden);
    }
    // Closing is a one-shot transition; the winner is assigned and notified
    // exactly once.
    let active: bool = listing.get("active");
    if !active {
        return Err(RequestError::RunTimeError("This auction is already closed."));
    }

    // The chronologically last bid wins.
    let winner = sqlx::query(
        r#"
        SELECT users.id AS "user_id", users.email AS "email"
        FROM   bids
            JOIN users
                ON users.id = bids.user_id
        WHERE  bids.auction_id = $1
        ORDER  BY bids.id DESC
        LIMIT  1
        "#,
    )
    .bind(auction_id)
    .fetch_optional(&mut tx)
    .await?;

    sqlx::query("UPDATE auctions SET active = FALSE WHERE id = $1")
        .bind(auction_id)
        .execute(&mut tx)
        .await?;

    let buyer_email = if let Some(row) = winner {
        let buyer_id: i64 = row.get("user_id");
        sqlx::query("UPDATE auctions SET buyer_id = $1 WHERE id = $2")
            .bind(buyer_id)
            .bind(auction_id)
            .execute(&mut tx)
            .await?;
        Some(row.get("email"))
    } else {
        None
    };
    tx.commit().await?;

    let auction = get_auction_by_id_in_db(pool, Some(user_id), auction_id).await?;
    Ok((auction, buyer_email))
}

pub async fn toggle_watch_in_db(
    pool: &SqlitePool,
    user_id: i64,
    auction_id: i64,
) -> Result<Auction, RequestError> {
    let mut tx = pool.begin().await?;

    let auction = sqlx::query("SELECT id FROM auctions WHERE id = $1")
        .bind(auction_id)
        .fetch_optional(&mut tx)
        .await?;
    if auction.is_none() {
        return Err(RequestError::NotFound("Auction not found"));
    }

    let watching = sqlx::query("SELECT 1 FROM watchers WHERE auction_id = $1 AND user_id = $2")
        .bind(auction_id)
        .bind(user_id)
        .fetch_optional(&mut tx)
        .await?;
    if watching.is_some() {
        sqlx::query("DELETE FROM watchers WHERE auction_id = $1 AND user_id = $2")
            .bind(auction_id)
            .bind(user_id)
            .execute(&mut tx)
            .await?;
    } else {
        sqlx::query("INSERT INTO watchers (auction_id, user_id) VALUES ($1, $2)")
            .bind(auction_id)
            .bind(user_id)
            .execute(&mut tx)
            .await?;
    }
    tx.commit().await?;

    get_auction_by_id_in_db(pool, Some(user_id), auction_id).await
}
