use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Category};

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Category>(
        "SELECT id, name FROM categories ORDER BY name ASC",
    )
    .fetch_all(&mut tx)
    .await?;
    tx.commit().await?;
    Ok(result)
}
