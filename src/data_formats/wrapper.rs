use serde::{Deserialize, Serialize};

use super::response::{AuctionResponse, BidResponse, CommentResponse};

#[derive(Debug, Deserialize, Serialize)]
pub struct UserWrapper<T> {
    pub user: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AuctionWrapper<T> {
    pub auction: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct BidWrapper<T> {
    pub bid: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CommentWrapper<T> {
    pub comment: T,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleAuctionsWrapper {
    pub auctions: Vec<AuctionResponse>,
    #[serde(rename = "auctionsCount")]
    pub auctions_count: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleBidsWrapper {
    pub bids: Vec<BidResponse>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct MultipleCommentsWrapper {
    pub comments: Vec<CommentResponse>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CategoriesWrapper {
    pub categories: Vec<String>,
}

impl<T> UserWrapper<T> {
    pub fn wrap_with_user_data(request: T) -> UserWrapper<T> {
        UserWrapper { user: request }
    }
}

impl MultipleAuctionsWrapper {
    pub fn new(auctions: Vec<AuctionResponse>) -> Self {
        let auctions_count = auctions.len();
        MultipleAuctionsWrapper {
            auctions,
            auctions_count,
        }
    }
}
