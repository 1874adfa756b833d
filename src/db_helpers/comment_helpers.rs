use sqlx::{Row, Sqlite, SqlitePool};

use crate::{data_formats::CommentRequest, errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
    SELECT comments.id         AS "id",
           comments.auction_id AS "auction_id",
           comments.user_id    AS "user_id",
           comments.body       AS "body",
           comments.created_at AS "created_at",
           comments.active     AS "active",
           users.username      AS "username"
    FROM   comments
        JOIN users
            ON users.id = comments.user_id
"#;

pub async fn add_comment_to_auction_in_db(
    pool: &SqlitePool,
    user_id: i64,
    auction_id: i64,
    CommentRequest { body }: CommentRequest,
) -> Result<Comment, RequestError> {
    let mut tx = pool.begin().await?;

    let auction = sqlx::query("SELECT id FROM auctions WHERE id = $1")
        .bind(auction_id)
        .fetch_optional(&mut tx)
        .await?;
    if auction.is_none() {
        return Err(RequestError::NotFound("Auction not found"));
    }

    let row = sqlx::query(
        r#"
        INSERT INTO comments (auction_id, user_id, body)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(auction_id)
    .bind(user_id)
    .bind(&body)
    .fetch_one(&mut tx)
    .await?;
    let comment_id: i64 = row.get("id");

    let query = format!("{COMMENT_QUERY} WHERE comments.id = $1");
    let comment = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(comment_id)
        .fetch_one(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(comment)
}

pub async fn get_comments_for_auction_in_db(
    pool: &SqlitePool,
    auction_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!(
        "{COMMENT_QUERY} WHERE comments.auction_id = $1 AND comments.active = TRUE ORDER BY comments.id ASC"
    );
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(auction_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}
