#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use listings_api::app::build_router;
use listings_api::config::{AppEnv, Config};
use listings_api::repos::{
    Identity, ListingRow, ListingStore, MemoryIdentityStore, MemoryListingStore, NewListing,
    UserRecord,
};
use listings_api::services::auth::build_auth_service;
use listings_api::services::id_codec::IdCodec;
use listings_api::services::uploads::DiskPhotoStore;
use listings_api::state::AppState;

pub const SECRET: &str = "test-secret";
pub const BOUNDARY: &str = "X-LISTINGS-TEST-BOUNDARY";

pub struct TestApp {
    pub router: Router,
    pub listings: Arc<MemoryListingStore>,
    pub identities: Arc<MemoryIdentityStore>,
    pub codec: IdCodec,
    pub uploads: TempDir,
}

fn config(upload_dir: &TempDir) -> Config {
    Config {
        addr: "127.0.0.1:0".parse().expect("addr"),
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        app_env: AppEnv::Development,
        cors_allowed_origins: vec![],
        sqids_min_length: 10,
        sqids_alphabet: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".into(),
        jwt_secret: SECRET.into(),
        access_token_leeway_seconds: 0,
        upload_dir: upload_dir.path().to_path_buf(),
        max_body_bytes: 1024 * 1024,
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Same wiring, but listings go through `listings` instead of the memory store.
    pub fn with_listing_store(listings: Arc<dyn ListingStore>) -> Self {
        Self::build(Some(listings))
    }

    fn build(listing_override: Option<Arc<dyn ListingStore>>) -> Self {
        let uploads = tempfile::tempdir().expect("tempdir");
        let config = config(&uploads);

        let listings = Arc::new(MemoryListingStore::new());
        let identities = Arc::new(MemoryIdentityStore::new());
        let codec = IdCodec::new(config.sqids_min_length, &config.sqids_alphabet).expect("codec");

        let listing_store: Arc<dyn ListingStore> = match listing_override {
            Some(store) => store,
            None => listings.clone() as Arc<dyn ListingStore>,
        };
        let auth = build_auth_service(&config, identities.clone());
        let photos = Arc::new(DiskPhotoStore::new(config.upload_dir.clone()));

        let state = AppState::new(listing_store, identities.clone(), photos, codec.clone(), auth);
        let router = build_router(state, &config);

        Self {
            router,
            listings,
            identities,
            codec,
            uploads,
        }
    }

    pub async fn add_user(&self, first_name: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            first_name: first_name.into(),
            last_name: "Tester".into(),
            email: format!("{}@example.com", first_name.to_lowercase()),
            profile_image_path: Some("public/uploads/avatar.png".into()),
        };
        self.identities
            .insert(UserRecord {
                identity: identity.clone(),
                password_hash: "$2b$10$not-a-real-hash".into(),
            })
            .await;
        identity
    }

    pub async fn add_listing(&self, creator_id: Uuid, title: &str) -> ListingRow {
        self.listings
            .create(new_listing(creator_id, title))
            .await
            .expect("create listing")
    }

    pub fn public_id(&self, listing_id: i64) -> String {
        self.codec.encode(listing_id).expect("encode")
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.expect("infallible")
    }
}

pub fn new_listing(creator_id: Uuid, title: &str) -> NewListing {
    NewListing {
        creator_id,
        category: Some("Beach".into()),
        kind: Some("An entire place".into()),
        street_address: "1 Shore Rd".into(),
        apt_suite: None,
        city: "Tofino".into(),
        province: "BC".into(),
        country: "Canada".into(),
        guest_count: 4,
        bedroom_count: 2,
        bed_count: 2,
        bathroom_count: 1,
        amenities: vec!["Wifi".into()],
        listing_photo_paths: vec!["public/uploads/seed.jpg".into()],
        title: title.into(),
        description: "Steps from the waves".into(),
        highlight: "Ocean view".into(),
        highlight_desc: "Watch the sunset".into(),
        price: 120.0,
    }
}

/// HS256 token for `user_id` expiring `exp_offset` seconds from now.
pub fn token_for(user_id: Uuid, exp_offset: i64) -> String {
    let now = Utc::now().timestamp();
    jsonwebtoken::encode(
        &Header::default(),
        &json!({ "sub": user_id.to_string(), "iat": now, "exp": now + exp_offset }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign")
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json")))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::empty()).expect("request")
}

/// Multipart body with text fields and `listingPhotos` file parts.
pub fn multipart_request(
    uri: &str,
    auth: Option<&str>,
    fields: &[(&str, &str)],
    photos: &[(&str, &[u8])],
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (file_name, bytes) in photos {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"listingPhotos\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, bearer(token));
    }
    builder.body(Body::from(body)).expect("request")
}

pub async fn read_json(resp: Response<Body>) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub fn listing_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("category", "Cabins"),
        ("type", "An entire place"),
        ("streetAddress", "9 Pine Way"),
        ("city", "Whistler"),
        ("province", "BC"),
        ("country", "Canada"),
        ("guestCount", "6"),
        ("bedroomCount", "3"),
        ("bedCount", "4"),
        ("bathroomCount", "2"),
        ("amenities", "Wifi"),
        ("amenities", "Fireplace"),
        ("title", "Cabin in the woods"),
        ("description", "Quiet and warm"),
        ("highlight", "Hot tub"),
        ("highlightDesc", "Under the stars"),
        ("price", "210"),
    ]
}
