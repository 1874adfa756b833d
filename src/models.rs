use chrono::NaiveDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Read model for an auction listing. Joined columns (category name, author
/// and buyer usernames, watcher info for the requesting user) come from the
/// listing query in `db_helpers::auction_helpers`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub starting_bid: i64,
    pub current_bid: Option<i64>,
    pub image: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub author_id: i64,
    pub buyer_id: Option<i64>,
    pub category_name: String,
    pub author_username: String,
    pub buyer_username: Option<String>,
    pub watchers_count: i64,
    pub watched: bool,
}

impl Auction {
    /// Bid acceptance rule: a bid must reach the starting price and beat the
    /// current price once one exists. Amounts are integer cents.
    pub fn accepts_bid(&self, amount: i64) -> bool {
        amount >= self.starting_bid && self.current_bid.map_or(true, |current| amount > current)
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub created_at: NaiveDateTime,
    pub username: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: i64,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub active: bool,
    pub username: String,
}
