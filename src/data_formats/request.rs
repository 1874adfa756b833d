use serde::{Deserialize, Serialize};

// ----------------- User Requests -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirmation: String,
}

// ----------------- Auction Requests -----------------
#[derive(Deserialize, Serialize, Debug)]
pub struct NewAuctionRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Starting price in integer cents.
    pub starting_bid: i64,
    #[serde(default)]
    pub image: Option<String>,
    pub category_id: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct BidRequest {
    /// Offered amount in integer cents.
    pub amount: i64,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentRequest {
    pub body: String,
}
