use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Bid};

const BID_QUERY: &str = r#"
    SELECT bids.id         AS "id",
           bids.auction_id AS "auction_id",
           bids.user_id    AS "user_id",
           bids.amount     AS "amount",
           bids.created_at AS "created_at",
           users.username  AS "username"
    FROM   bids
        JOIN users
            ON users.id = bids.user_id
    WHERE  bids.auction_id = $1
    ORDER  BY bids.id ASC
"#;

pub async fn list_bids_for_auction_in_db(
    pool: &SqlitePool,
    auction_id: i64,
) -> Result<Vec<Bid>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Bid>(BID_QUERY)
        .bind(auction_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
