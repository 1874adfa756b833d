use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{StatusCode, Uri},
    Extension, Json,
};
use sqlx::SqlitePool;

use crate::{
    authentication::{
        get_jwt_token, hash_password_argon2, verify_password_argon2, AuthUser, MaybeUser,
    },
    db_helpers::{
        add_comment_to_auction_in_db, close_auction_in_db, create_auction_in_db,
        get_auction_by_id_in_db, get_comments_for_auction_in_db, get_user_by_id,
        get_user_by_username, insert_user, list_active_auctions_in_db,
        list_auctions_by_category_in_db, list_bids_for_auction_in_db, list_categories_in_db,
        list_purchases_in_db, list_watchlist_in_db, place_bid_in_db, search_auctions_in_db,
        toggle_watch_in_db,
    },
    errors::{RequestError, RequestErrorJsonWrapper},
    notifications::WinnerNotification,
    AuctionResponse, AuctionWrapper, BidRequest, BidResponse, BidWrapper, CategoriesWrapper,
    CommentRequest, CommentResponse, CommentWrapper, LoginRequest, MultipleAuctionsWrapper,
    MultipleBidsWrapper, MultipleCommentsWrapper, NewAuctionRequest, RegisterRequest, SearchParams,
    UserResponse, UserWrapper,
};

type UserJson = UserWrapper<UserResponse>;
type AuctionJson = AuctionWrapper<AuctionResponse>;

type JsonResult<T> = Result<Json<T>, (StatusCode, Json<RequestErrorJsonWrapper>)>;

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> Result<(), (StatusCode, String)> {
    Err((
        StatusCode::NOT_FOUND,
        format!("URL {} provided was not found", uri),
    ))
}

// ----------------- User Handlers -----------------
pub async fn register_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(UserWrapper { user: mut request }): Json<UserWrapper<RegisterRequest>>,
) -> JsonResult<UserJson> {
    if request.password != request.confirmation {
        return Err(RequestError::RunTimeError("Passwords must match.").to_json_response());
    }
    request.password = hash_password_argon2(request.password)
        .await
        .map_err(|_| RequestError::ServerError.to_json_response())?;

    let user = insert_user(&pool, &request).await.map_err(|e| {
        if let RequestError::DatabaseError(sqlx::Error::Database(db_error)) = &e {
            if db_error.message().contains("users.username") {
                return RequestError::RunTimeError("Username already taken.").to_json_response();
            }
            if db_error.message().contains("users.email") {
                return RequestError::RunTimeError("Email already taken.").to_json_response();
            }
        }
        e.to_json_response()
    })?;

    let token = get_jwt_token(user.id).map_err(|_| RequestError::ServerError.to_json_response())?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn login_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(UserWrapper { user: request }): Json<UserWrapper<LoginRequest>>,
) -> JsonResult<UserJson> {
    let user = get_user_by_username(&pool, &request.username)
        .await
        .map_err(|e| e.to_json_response())?;
    let user = match user {
        Some(user) => user,
        None => {
            return Err(
                RequestError::RunTimeError("Invalid username and/or password.").to_json_response(),
            );
        }
    };
    let is_password_correct = verify_password_argon2(request.password, &user.password)
        .await
        .map_err(|_| RequestError::ServerError.to_json_response())?;

    if !is_password_correct {
        return Err(
            RequestError::RunTimeError("Invalid username and/or password.").to_json_response(),
        );
    }
    let token = get_jwt_token(user.id).map_err(|_| RequestError::ServerError.to_json_response())?;
    Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
        user, token,
    ))))
}

pub async fn get_current_user(
    Extension(pool): Extension<Arc<SqlitePool>>,
    MaybeUser(maybe_user): MaybeUser,
) -> JsonResult<UserJson> {
    if let Some(AuthUser { id, token }) = maybe_user {
        let user = get_user_by_id(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?;
        let user = match user {
            Some(user) => user,
            None => return Err(RequestError::NotFound("User not found").to_json_response()),
        };
        return Ok(Json(UserWrapper::wrap_with_user_data(UserResponse::new(
            user, token,
        ))));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Listing Handlers -----------------
pub async fn list_auctions(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
) -> JsonResult<MultipleAuctionsWrapper> {
    let auctions = list_active_auctions_in_db(&pool, maybe_user.get_id())
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(MultipleAuctionsWrapper::new(
        auctions.into_iter().map(AuctionResponse::new).collect(),
    )))
}

pub async fn search_auctions(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Query(SearchParams { q }): Query<SearchParams>,
) -> JsonResult<MultipleAuctionsWrapper> {
    let auctions = search_auctions_in_db(&pool, maybe_user.get_id(), &q)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(MultipleAuctionsWrapper::new(
        auctions.into_iter().map(AuctionResponse::new).collect(),
    )))
}

pub async fn list_categories(
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> JsonResult<CategoriesWrapper> {
    let categories = list_categories_in_db(&pool)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(CategoriesWrapper {
        categories: categories.into_iter().map(|c| c.name).collect(),
    }))
}

pub async fn list_category_auctions(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(category_name): Path<String>,
) -> JsonResult<MultipleAuctionsWrapper> {
    let auctions = list_auctions_by_category_in_db(&pool, maybe_user.get_id(), &category_name)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(MultipleAuctionsWrapper::new(
        auctions.into_iter().map(AuctionResponse::new).collect(),
    )))
}

pub async fn get_watchlist(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> JsonResult<MultipleAuctionsWrapper> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let auctions = list_watchlist_in_db(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(MultipleAuctionsWrapper::new(
            auctions.into_iter().map(AuctionResponse::new).collect(),
        )));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn get_purchases(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
) -> JsonResult<MultipleAuctionsWrapper> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let auctions = list_purchases_in_db(&pool, id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(MultipleAuctionsWrapper::new(
            auctions.into_iter().map(AuctionResponse::new).collect(),
        )));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Auction Handlers -----------------
pub async fn get_auction(
    Extension(pool): Extension<Arc<SqlitePool>>,
    maybe_user: MaybeUser,
    Path(auction_id): Path<i64>,
) -> JsonResult<AuctionJson> {
    let auction = get_auction_by_id_in_db(&pool, maybe_user.get_id(), auction_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(AuctionWrapper {
        auction: AuctionResponse::new(auction),
    }))
}

pub async fn create_auction(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Json(AuctionWrapper { auction: request }): Json<AuctionWrapper<NewAuctionRequest>>,
) -> JsonResult<AuctionJson> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        if request.starting_bid < 1 {
            return Err(
                RequestError::RunTimeError("Starting price must be positive.").to_json_response(),
            );
        }
        let auction = create_auction_in_db(&pool, id, request)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(AuctionWrapper {
            auction: AuctionResponse::new(auction),
        }));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn place_bid(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
    Json(BidWrapper { bid: request }): Json<BidWrapper<BidRequest>>,
) -> JsonResult<AuctionJson> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let auction = place_bid_in_db(&pool, id, auction_id, request.amount)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(AuctionWrapper {
            auction: AuctionResponse::new(auction),
        }));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn close_auction(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
) -> JsonResult<AuctionJson> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let (auction, buyer_email) = close_auction_in_db(&pool, id, auction_id)
            .await
            .map_err(|e| e.to_json_response())?;
        if let Some(email) = buyer_email {
            WinnerNotification::new(&email, &auction.title).dispatch();
        }
        return Ok(Json(AuctionWrapper {
            auction: AuctionResponse::new(auction),
        }));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn toggle_watch(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
) -> JsonResult<AuctionJson> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let auction = toggle_watch_in_db(&pool, id, auction_id)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(AuctionWrapper {
            auction: AuctionResponse::new(auction),
        }));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

// ----------------- Bid Handlers -----------------
pub async fn list_bids(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
) -> JsonResult<MultipleBidsWrapper> {
    let bids = list_bids_for_auction_in_db(&pool, auction_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(MultipleBidsWrapper {
        bids: bids.into_iter().map(BidResponse::new).collect(),
    }))
}

// ----------------- Comment Handlers -----------------
pub async fn add_comment(
    MaybeUser(maybe_user): MaybeUser,
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
    Json(CommentWrapper { comment: request }): Json<CommentWrapper<CommentRequest>>,
) -> JsonResult<CommentWrapper<CommentResponse>> {
    if let Some(AuthUser { id, .. }) = maybe_user {
        let comment = add_comment_to_auction_in_db(&pool, id, auction_id, request)
            .await
            .map_err(|e| e.to_json_response())?;
        return Ok(Json(CommentWrapper {
            comment: CommentResponse::new(comment),
        }));
    }
    Err(RequestError::NotAuthorized("Need to be authorized").to_json_response())
}

pub async fn list_comments(
    Extension(pool): Extension<Arc<SqlitePool>>,
    Path(auction_id): Path<i64>,
) -> JsonResult<MultipleCommentsWrapper> {
    let comments = get_comments_for_auction_in_db(&pool, auction_id)
        .await
        .map_err(|e| e.to_json_response())?;
    Ok(Json(MultipleCommentsWrapper {
        comments: comments.into_iter().map(CommentResponse::new).collect(),
    }))
}
