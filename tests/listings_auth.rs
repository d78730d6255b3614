//! HTTP-level checks for the bearer middleware and the ownership guard,
//! driven through the full router with in-memory stores.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use listings_api::repos::error::{RepoError, RepoResult};
use listings_api::repos::{ListingRow, ListingStore, NewListing};

use common::*;

#[tokio::test]
async fn missing_credential_is_rejected_before_the_handler() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let resp = app.send(json_request("PUT", &uri, None, json!({ "price": 1 }))).await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
    assert!(body["error"]["message"].as_str().unwrap().contains("no credential"));

    let stored = app.listings.find_by_id(listing.listing_id).await.unwrap();
    assert_eq!(stored.unwrap(), listing);
}

#[tokio::test]
async fn wrong_scheme_counts_as_no_credential() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let req = axum::http::Request::builder()
        .method("DELETE")
        .uri(&uri)
        .header("authorization", format!("Basic {}", token_for(owner.id, 60)))
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = read_json(app.send(req).await).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");
}

#[tokio::test]
async fn expired_token_is_an_invalid_credential() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let expired = token_for(owner.id, -120);
    let resp = app
        .send(json_request("PUT", &uri, Some(&expired), json!({ "price": 1 })))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(body["error"]["message"].as_str().unwrap().contains("invalid token"));
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let now = chrono::Utc::now().timestamp();
    let forged = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "sub": owner.id.to_string(), "exp": now + 60 }),
        &jsonwebtoken::EncodingKey::from_secret(b"someone-else"),
    )
    .unwrap();

    let resp = app.send(empty_request("DELETE", &uri, Some(&forged))).await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(app.listings.find_by_id(listing.listing_id).await.unwrap().is_some());
}

#[tokio::test]
async fn vanished_identity_looks_like_an_invalid_token() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let token = token_for(owner.id, 60);
    assert!(app.identities.remove(owner.id).await);

    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));
    let resp = app.send(empty_request("DELETE", &uri, Some(&token))).await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_TOKEN");
    assert!(app.listings.find_by_id(listing.listing_id).await.unwrap().is_some());
}

#[tokio::test]
async fn non_owner_delete_is_forbidden_and_leaves_the_listing() {
    let app = TestApp::new();
    let u1 = app.add_user("Ada").await;
    let u2 = app.add_user("Grace").await;
    let listing = app.add_listing(u2.id, "Grace's loft").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let resp = app
        .send(empty_request("DELETE", &uri, Some(&token_for(u1.id, 60))))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let stored = app.listings.find_by_id(listing.listing_id).await.unwrap();
    assert_eq!(stored.unwrap(), listing);
}

#[tokio::test]
async fn non_owner_update_is_forbidden_and_changes_nothing() {
    let app = TestApp::new();
    let u1 = app.add_user("Ada").await;
    let u2 = app.add_user("Grace").await;
    let listing = app.add_listing(u2.id, "Grace's loft").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(u1.id, 60)),
            json!({ "price": 1, "title": "Mine now" }),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let stored = app.listings.find_by_id(listing.listing_id).await.unwrap();
    assert_eq!(stored.unwrap(), listing);
}

#[tokio::test]
async fn owner_update_changes_only_the_sent_fields() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let public_id = app.public_id(listing.listing_id);
    let uri = format!("/api/v1/listings/{public_id}");

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(owner.id, 60)),
            json!({ "price": 150 }),
        ))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], public_id);
    assert_eq!(body["price"], 150.0);
    assert_eq!(body["title"], "Surf shack");
    assert_eq!(body["creatorId"], owner.id.to_string());

    let stored = app
        .listings
        .find_by_id(listing.listing_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.price, 150.0);
    assert_eq!(
        ListingRow {
            price: listing.price,
            updated_at: listing.updated_at,
            ..stored
        },
        listing
    );
}

#[tokio::test]
async fn update_cannot_reassign_the_creator() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let other = app.add_user("Grace").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    for body in [
        json!({ "creator": other.id }),
        json!({ "creatorId": other.id, "price": 99 }),
    ] {
        let resp = app
            .send(json_request("PUT", &uri, Some(&token_for(owner.id, 60)), body))
            .await;
        let (status, body) = read_json(resp).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INVALID_BODY");
    }

    let stored = app.listings.find_by_id(listing.listing_id).await.unwrap();
    assert_eq!(stored.unwrap(), listing);
}

#[tokio::test]
async fn update_rejects_invalid_values() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(owner.id, 60)),
            json!({ "price": -5 }),
        ))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn update_on_a_missing_listing_is_not_found() {
    let app = TestApp::new();
    let user = app.add_user("Ada").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(424242));

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(user.id, 60)),
            json!({ "price": 150 }),
        ))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn non_owner_update_is_forbidden_even_with_a_rejected_body() {
    let app = TestApp::new();
    let u1 = app.add_user("Ada").await;
    let u2 = app.add_user("Grace").await;
    let listing = app.add_listing(u2.id, "Grace's loft").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    for body in [
        json!({ "creatorId": u1.id, "price": 1 }),
        json!({ "id": "abc" }),
        json!({ "price": "free" }),
    ] {
        let resp = app
            .send(json_request("PUT", &uri, Some(&token_for(u1.id, 60)), body))
            .await;
        let (status, body) = read_json(resp).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "FORBIDDEN");
    }

    let stored = app.listings.find_by_id(listing.listing_id).await.unwrap();
    assert_eq!(stored.unwrap(), listing);
}

#[tokio::test]
async fn update_with_a_rejected_body_on_a_missing_listing_is_not_found() {
    let app = TestApp::new();
    let user = app.add_user("Ada").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(424242));

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(user.id, 60)),
            json!({ "creatorId": user.id }),
        ))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn delete_on_a_missing_listing_is_not_found() {
    let app = TestApp::new();
    let user = app.add_user("Ada").await;
    let other = app.add_listing(user.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(424242));

    let resp = app
        .send(empty_request("DELETE", &uri, Some(&token_for(user.id, 60))))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(app.listings.find_by_id(other.listing_id).await.unwrap().is_some());
}

#[tokio::test]
async fn undecodable_public_id_is_not_found() {
    let app = TestApp::new();
    let user = app.add_user("Ada").await;

    let resp = app
        .send(empty_request(
            "DELETE",
            "/api/v1/listings/!!not-an-id!!",
            Some(&token_for(user.id, 60)),
        ))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .send(empty_request("GET", "/api/v1/listings/!!not-an-id!!", None))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_delete_removes_the_listing() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let public_id = app.public_id(listing.listing_id);
    let uri = format!("/api/v1/listings/{public_id}");

    let resp = app
        .send(empty_request("DELETE", &uri, Some(&token_for(owner.id, 60))))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "listing deleted");
    assert_eq!(body["id"], public_id);
    assert!(app.listings.find_by_id(listing.listing_id).await.unwrap().is_none());

    let resp = app.send(empty_request("GET", &uri, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_by_id_is_public_and_carries_a_sanitized_creator() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let (status, body) = read_json(app.send(empty_request("GET", &uri, None)).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Surf shack");
    assert_eq!(body["creator"]["userId"], owner.id.to_string());
    assert_eq!(body["creator"]["firstName"], "Ada");
    assert!(body["creator"].get("password").is_none());
    assert!(body["creator"].get("passwordHash").is_none());
    assert!(!body.to_string().contains("not-a-real-hash"));
}

#[tokio::test]
async fn list_and_search_are_public() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    app.add_listing(owner.id, "Surf shack").await;
    app.add_listing(owner.id, "Harbour flat").await;

    let (status, body) =
        read_json(app.send(empty_request("GET", "/api/v1/listings", None)).await).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap().to_string())
        .collect();
    // newest first
    assert_eq!(titles, vec!["Harbour flat", "Surf shack"]);

    let (_, body) = read_json(
        app.send(empty_request("GET", "/api/v1/listings?category=Cabins", None))
            .await,
    )
    .await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = read_json(
        app.send(empty_request("GET", "/api/v1/listings/search/SURF", None))
            .await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Surf shack");

    let (_, body) = read_json(
        app.send(empty_request("GET", "/api/v1/listings/search/all", None))
            .await,
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn create_binds_the_creator_to_the_token_subject() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let other = app.add_user("Grace").await;

    let other_id = other.id.to_string();
    let mut fields: Vec<(&str, &str)> = listing_fields();
    fields.push(("creator", &other_id));

    let req = multipart_request(
        "/api/v1/listings",
        Some(&token_for(owner.id, 60)),
        &fields,
        &[("front.JPG", &b"fake-jpeg-bytes"[..]), ("back.png", &b"more-bytes"[..])],
    );
    let (status, body) = read_json(app.send(req).await).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["creatorId"], owner.id.to_string());
    assert_eq!(body["title"], "Cabin in the woods");
    assert_eq!(body["amenities"], json!(["Wifi", "Fireplace"]));

    let paths = body["listingPhotoPaths"].as_array().unwrap();
    assert_eq!(paths.len(), 2);
    for path in paths {
        let path = std::path::Path::new(path.as_str().unwrap());
        assert!(path.starts_with(app.uploads.path()));
        assert!(path.exists());
        let stored_name = path.file_name().unwrap().to_string_lossy();
        assert!(!stored_name.contains("front") && !stored_name.contains("back"));
    }
}

#[tokio::test]
async fn create_requires_a_credential_and_a_photo() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;

    let req = multipart_request("/api/v1/listings", None, &listing_fields(), &[("a.jpg", &b"x"[..])]);
    assert_eq!(app.send(req).await.status(), StatusCode::UNAUTHORIZED);

    let req = multipart_request(
        "/api/v1/listings",
        Some(&token_for(owner.id, 60)),
        &listing_fields(),
        &[],
    );
    let (status, body) = read_json(app.send(req).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_PHOTO");

    let (_, body) =
        read_json(app.send(empty_request("GET", "/api/v1/listings", None)).await).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_needs_no_credential() {
    let app = TestApp::new();

    let resp = app.send(empty_request("GET", "/api/v1/health", None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
}

/// Every call fails as if the database were down.
struct DownStore;

#[async_trait]
impl ListingStore for DownStore {
    async fn list(&self, _category: Option<&str>) -> RepoResult<Vec<ListingRow>> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn search(&self, _term: &str) -> RepoResult<Vec<ListingRow>> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn find_by_id(&self, _listing_id: i64) -> RepoResult<Option<ListingRow>> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn create(&self, _listing: NewListing) -> RepoResult<ListingRow> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn save(&self, _listing: &ListingRow) -> RepoResult<Option<ListingRow>> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }

    async fn delete(&self, _listing_id: i64) -> RepoResult<bool> {
        Err(RepoError::Db(sqlx::Error::PoolTimedOut))
    }
}

#[tokio::test]
async fn store_outage_is_service_unavailable() {
    let app = TestApp::with_listing_store(Arc::new(DownStore));
    let user = app.add_user("Ada").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(1));

    let resp = app
        .send(json_request(
            "PUT",
            &uri,
            Some(&token_for(user.id, 60)),
            json!({ "price": 150 }),
        ))
        .await;
    let (status, body) = read_json(resp).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");

    let resp = app.send(empty_request("GET", "/api/v1/listings", None)).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn failed_create_leaves_no_photos_behind() {
    let app = TestApp::with_listing_store(Arc::new(DownStore));
    let owner = app.add_user("Ada").await;

    let req = multipart_request(
        "/api/v1/listings",
        Some(&token_for(owner.id, 60)),
        &listing_fields(),
        &[("front.jpg", &b"one"[..]), ("back.jpg", &b"two"[..])],
    );
    let (status, body) = read_json(app.send(req).await).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "STORE_UNAVAILABLE");

    let left = std::fs::read_dir(app.uploads.path()).unwrap().count();
    assert_eq!(left, 0);
}

#[tokio::test]
async fn token_with_legacy_id_claim_is_accepted() {
    let app = TestApp::new();
    let owner = app.add_user("Ada").await;
    let listing = app.add_listing(owner.id, "Surf shack").await;
    let uri = format!("/api/v1/listings/{}", app.public_id(listing.listing_id));

    let now = chrono::Utc::now().timestamp();
    let legacy = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "id": owner.id.to_string(), "exp": now + 60 }),
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let resp = app
        .send(json_request("PUT", &uri, Some(&legacy), json!({ "title": "Renamed" })))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
}
