use serde::{Deserialize, Serialize};

use crate::models::{Auction, Bid, Comment, User};

#[derive(Deserialize, Serialize, Debug)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct AuctionResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "startingBid")]
    pub starting_bid: i64,
    #[serde(rename = "currentBid")]
    pub current_bid: Option<i64>,
    pub image: Option<String>,
    pub category: String,
    pub active: bool,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    pub author: String,
    pub buyer: Option<String>,
    #[serde(rename = "watchersCount")]
    pub watchers_count: i64,
    pub watched: bool,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct BidResponse {
    pub amount: i64,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CommentResponse {
    pub id: i64,
    pub body: String,
    pub username: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl UserResponse {
    pub fn new(
        User {
            username, email, ..
        }: User,
        token: String,
    ) -> Self {
        UserResponse {
            username,
            email,
            token,
        }
    }
}

impl AuctionResponse {
    pub fn new(
        Auction {
            id,
            title,
            description,
            starting_bid,
            current_bid,
            image,
            active,
            created_at,
            buyer_username,
            category_name,
            author_username,
            watchers_count,
            watched,
            ..
        }: Auction,
    ) -> Self {
        AuctionResponse {
            id,
            title,
            description,
            starting_bid,
            current_bid,
            image,
            category: category_name,
            active,
            created_at: created_at.to_string(),
            author: author_username,
            buyer: buyer_username,
            watchers_count,
            watched,
        }
    }
}

impl BidResponse {
    pub fn new(
        Bid {
            amount,
            username,
            created_at,
            ..
        }: Bid,
    ) -> Self {
        BidResponse {
            amount,
            username,
            created_at: created_at.to_string(),
        }
    }
}

impl CommentResponse {
    pub fn new(
        Comment {
            id,
            body,
            username,
            created_at,
            ..
        }: Comment,
    ) -> Self {
        CommentResponse {
            id,
            body,
            username,
            created_at: created_at.to_string(),
        }
    }
}
