use std::{sync::Arc, time::Duration};

use auctions::{get_random_free_port, init_db_from_url, make_router};
use axum::Extension;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Boots the full router against a throwaway SQLite database and returns a
/// client plus the base url. Each test gets its own database file so the
/// suite can run in parallel.
async fn spawn_app(test_name: &str) -> (Client, String) {
    std::env::set_var("JWT_SECRET", "integration-test-secret");
    let path = std::env::temp_dir().join(format!(
        "auctions_{}_{}.db",
        std::process::id(),
        test_name
    ));
    let _ = std::fs::remove_file(&path);
    let db_url = format!("sqlite://{}", path.display());
    let pool = init_db_from_url(&db_url)
        .await
        .expect("failed to set up test database");

    let (_, addr) = get_random_free_port();
    let app = make_router().layer(Extension(Arc::new(pool)));
    tokio::spawn(async move {
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await
            .unwrap();
    });

    let client = Client::new();
    let base_url = format!("http://{}", addr);
    for _ in 0..40 {
        if client
            .get(format!("{base_url}/check_health"))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    (client, base_url)
}

async fn register(client: &Client, url: &str, username: &str) -> String {
    let response = client
        .post(format!("{url}/users"))
        .json(&json!({
            "user": {
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "correct horse battery",
                "confirmation": "correct horse battery",
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["user"]["token"].as_str().unwrap().to_string()
}

async fn create_auction(
    client: &Client,
    url: &str,
    token: &str,
    title: &str,
    starting_bid: i64,
) -> i64 {
    let response = client
        .post(format!("{url}/auctions"))
        .header("Authorization", format!("Token {token}"))
        .json(&json!({
            "auction": {
                "title": title,
                "description": "integration test listing",
                "starting_bid": starting_bid,
                "category_id": 1,
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    body["auction"]["id"].as_i64().unwrap()
}

async fn place_bid(
    client: &Client,
    url: &str,
    token: &str,
    auction_id: i64,
    amount: i64,
) -> reqwest::Response {
    client
        .post(format!("{url}/auctions/{auction_id}/bids"))
        .header("Authorization", format!("Token {token}"))
        .json(&json!({ "bid": { "amount": amount } }))
        .send()
        .await
        .unwrap()
}

async fn get_auction(client: &Client, url: &str, token: Option<&str>, auction_id: i64) -> Value {
    let mut request = client.get(format!("{url}/auctions/{auction_id}"));
    if let Some(token) = token {
        request = request.header("Authorization", format!("Token {token}"));
    }
    let response = request.send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.json().await.unwrap()
}

#[tokio::test]
async fn register_login_and_fetch_current_user() {
    let (client, url) = spawn_app("register_login").await;
    register(&client, &url, "alice").await;

    let response = client
        .post(format!("{url}/users/login"))
        .json(&json!({
            "user": { "username": "alice", "password": "correct horse battery" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let token = body["user"]["token"].as_str().unwrap();
    assert_eq!(body["user"]["username"], "alice");

    let response = client
        .get(format!("{url}/user"))
        .header("Authorization", format!("Token {token}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["email"], "alice@example.com");

    let response = client
        .post(format!("{url}/users/login"))
        .json(&json!({
            "user": { "username": "alice", "password": "wrong password" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn registration_validates_confirmation_and_duplicates() {
    let (client, url) = spawn_app("register_validation").await;

    let response = client
        .post(format!("{url}/users"))
        .json(&json!({
            "user": {
                "username": "bob",
                "email": "bob@example.com",
                "password": "one password",
                "confirmation": "another password",
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"]["body"][0], "Passwords must match.");

    register(&client, &url, "bob").await;
    let response = client
        .post(format!("{url}/users"))
        .json(&json!({
            "user": {
                "username": "bob",
                "email": "bob2@example.com",
                "password": "correct horse battery",
                "confirmation": "correct horse battery",
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"]["body"][0], "Username already taken.");
}

#[tokio::test]
async fn new_auction_shows_up_in_the_active_listing() {
    let (client, url) = spawn_app("new_auction").await;
    let token = register(&client, &url, "seller").await;
    let auction_id = create_auction(&client, &url, &token, "Road bike", 500).await;

    let response = client.get(format!("{url}/auctions")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["id"], auction_id);
    assert_eq!(body["auctions"][0]["title"], "Road bike");
    assert_eq!(body["auctions"][0]["author"], "seller");
    assert_eq!(body["auctions"][0]["startingBid"], 500);
    assert!(body["auctions"][0]["currentBid"].is_null());
    assert_eq!(body["auctions"][0]["category"], "Electronics");

    let response = client
        .post(format!("{url}/auctions"))
        .header("Authorization", format!("Token {token}"))
        .json(&json!({
            "auction": {
                "title": "Free bike",
                "starting_bid": 0,
                "category_id": 1,
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn rejected_bids_leave_the_auction_unchanged() {
    let (client, url) = spawn_app("bid_rejection").await;
    let seller = register(&client, &url, "seller").await;
    let buyer = register(&client, &url, "buyer").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 500).await;

    // Below the starting price.
    let response = place_bid(&client, &url, &buyer, auction_id, 499).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["errors"]["body"][0],
        "Your bid must be greater than current price."
    );

    let body = get_auction(&client, &url, Some(&buyer), auction_id).await;
    assert!(body["auction"]["currentBid"].is_null());
    assert_eq!(body["auction"]["watched"], false);

    // Not exceeding the current price.
    let response = place_bid(&client, &url, &buyer, auction_id, 600).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = place_bid(&client, &url, &buyer, auction_id, 600).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = get_auction(&client, &url, Some(&buyer), auction_id).await;
    assert_eq!(body["auction"]["currentBid"], 600);
}

#[tokio::test]
async fn accepted_bid_updates_price_and_enrolls_the_bidder_as_watcher() {
    let (client, url) = spawn_app("bid_acceptance").await;
    let seller = register(&client, &url, "seller").await;
    let buyer = register(&client, &url, "buyer").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 500).await;

    let response = place_bid(&client, &url, &buyer, auction_id, 500).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["currentBid"], 500);
    assert_eq!(body["auction"]["watched"], true);

    let response = client
        .get(format!("{url}/watchlist"))
        .header("Authorization", format!("Token {buyer}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["id"], auction_id);

    let response = client
        .get(format!("{url}/auctions/{auction_id}/bids"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["bids"][0]["amount"], 500);
    assert_eq!(body["bids"][0]["username"], "buyer");
}

#[tokio::test]
async fn closing_assigns_the_last_bidder_as_buyer() {
    let (client, url) = spawn_app("close_with_bids").await;
    let seller = register(&client, &url, "seller").await;
    let first = register(&client, &url, "first_bidder").await;
    let second = register(&client, &url, "second_bidder").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;

    assert_eq!(
        place_bid(&client, &url, &first, auction_id, 150).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        place_bid(&client, &url, &second, auction_id, 200).await.status(),
        StatusCode::OK
    );

    // Only the author may close.
    let response = client
        .post(format!("{url}/auctions/{auction_id}/close"))
        .header("Authorization", format!("Token {first}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = get_auction(&client, &url, None, auction_id).await;
    assert_eq!(body["auction"]["active"], true);

    let response = client
        .post(format!("{url}/auctions/{auction_id}/close"))
        .header("Authorization", format!("Token {seller}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["active"], false);
    assert_eq!(body["auction"]["buyer"], "second_bidder");

    // A closed auction takes no further bids and leaves the listing.
    let response = place_bid(&client, &url, &first, auction_id, 300).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let response = client.get(format!("{url}/auctions")).send().await.unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 0);

    // The winner sees it under purchases.
    let response = client
        .get(format!("{url}/purchases"))
        .header("Authorization", format!("Token {second}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["id"], auction_id);
}

#[tokio::test]
async fn closing_without_bids_leaves_no_buyer() {
    let (client, url) = spawn_app("close_without_bids").await;
    let seller = register(&client, &url, "seller").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;

    let response = client
        .post(format!("{url}/auctions/{auction_id}/close"))
        .header("Authorization", format!("Token {seller}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["active"], false);
    assert!(body["auction"]["buyer"].is_null());
}

#[tokio::test]
async fn watch_toggle_flips_membership_exactly_once_per_call() {
    let (client, url) = spawn_app("watch_toggle").await;
    let seller = register(&client, &url, "seller").await;
    let watcher = register(&client, &url, "watcher").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;

    let response = client
        .post(format!("{url}/auctions/{auction_id}/watch"))
        .header("Authorization", format!("Token {watcher}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["watched"], true);
    assert_eq!(body["auction"]["watchersCount"], 1);

    let response = client
        .post(format!("{url}/auctions/{auction_id}/watch"))
        .header("Authorization", format!("Token {watcher}"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auction"]["watched"], false);
    assert_eq!(body["auction"]["watchersCount"], 0);

    // Anonymous toggling is rejected.
    let response = client
        .post(format!("{url}/auctions/{auction_id}/watch"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_matches_titles_case_insensitively_among_active_auctions() {
    let (client, url) = spawn_app("search").await;
    let seller = register(&client, &url, "seller").await;
    create_auction(&client, &url, &seller, "Road Bike", 100).await;
    create_auction(&client, &url, &seller, "Mountain bike", 100).await;
    create_auction(&client, &url, &seller, "Desk lamp", 100).await;
    let closed = create_auction(&client, &url, &seller, "Old BIKE", 100).await;
    client
        .post(format!("{url}/auctions/{closed}/close"))
        .header("Authorization", format!("Token {seller}"))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("{url}/auctions/search"))
        .query(&[("q", "bIkE")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 2);
    for auction in body["auctions"].as_array().unwrap() {
        let title = auction["title"].as_str().unwrap().to_lowercase();
        assert!(title.contains("bike"));
        assert_eq!(auction["active"], true);
    }
}

#[tokio::test]
async fn search_treats_like_metacharacters_as_literal_text() {
    let (client, url) = spawn_app("search_metacharacters").await;
    let seller = register(&client, &url, "seller").await;
    create_auction(&client, &url, &seller, "Desk lamp", 100).await;
    create_auction(&client, &url, &seller, "100% cotton shirt", 100).await;
    create_auction(&client, &url, &seller, "snake_case handle", 100).await;
    create_auction(&client, &url, &seller, "snakeless handle", 100).await;

    // "%" only matches titles containing a literal percent sign.
    let response = client
        .get(format!("{url}/auctions/search"))
        .query(&[("q", "%")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["title"], "100% cotton shirt");

    // "_" is not a single-character wildcard.
    let response = client
        .get(format!("{url}/auctions/search"))
        .query(&[("q", "e_c")])
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["title"], "snake_case handle");
}

#[tokio::test]
async fn closing_an_already_closed_auction_is_rejected() {
    let (client, url) = spawn_app("close_twice").await;
    let seller = register(&client, &url, "seller").await;
    let bidder = register(&client, &url, "bidder").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;
    assert_eq!(
        place_bid(&client, &url, &bidder, auction_id, 150).await.status(),
        StatusCode::OK
    );

    let response = client
        .post(format!("{url}/auctions/{auction_id}/close"))
        .header("Authorization", format!("Token {seller}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(format!("{url}/auctions/{auction_id}/close"))
        .header("Authorization", format!("Token {seller}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"]["body"][0], "This auction is already closed.");

    let body = get_auction(&client, &url, None, auction_id).await;
    assert_eq!(body["auction"]["active"], false);
    assert_eq!(body["auction"]["buyer"], "bidder");
}

#[tokio::test]
async fn category_browsing_filters_active_auctions() {
    let (client, url) = spawn_app("categories").await;
    let seller = register(&client, &url, "seller").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;

    let response = client
        .get(format!("{url}/categories"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let categories = body["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c == "Electronics"));

    let response = client
        .get(format!("{url}/categories/Electronics"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 1);
    assert_eq!(body["auctions"][0]["id"], auction_id);

    let response = client
        .get(format!("{url}/categories/Fashion"))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["auctionsCount"], 0);
}

#[tokio::test]
async fn comments_require_auth_and_are_listed_in_order() {
    let (client, url) = spawn_app("comments").await;
    let seller = register(&client, &url, "seller").await;
    let commenter = register(&client, &url, "commenter").await;
    let auction_id = create_auction(&client, &url, &seller, "Lamp", 100).await;

    let response = client
        .post(format!("{url}/auctions/{auction_id}/comments"))
        .json(&json!({ "comment": { "body": "anonymous drive-by" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for body in ["Does it still work?", "Is shipping included?"] {
        let response = client
            .post(format!("{url}/auctions/{auction_id}/comments"))
            .header("Authorization", format!("Token {commenter}"))
            .json(&json!({ "comment": { "body": body } }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = client
        .get(format!("{url}/auctions/{auction_id}/comments"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let comments = body["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["body"], "Does it still work?");
    assert_eq!(comments[0]["username"], "commenter");
    assert_eq!(comments[1]["body"], "Is shipping included?");
}

#[tokio::test]
async fn unknown_auction_returns_not_found() {
    let (client, url) = spawn_app("not_found").await;
    let response = client
        .get(format!("{url}/auctions/9999"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
