//! In-memory stores.
//!
//! Used by the integration tests and for running the router without Postgres.
//! Behaviour mirrors the Postgres repos: the identity store only ever hands out
//! the sanitized projection, and listing saves never touch `creator_id`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::repos::listing_repo::{ListingRow, ListingStore, NewListing};
use crate::repos::user_repo::{Identity, IdentityStore};

/// A stored user, including the secret the store keeps for the login service.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub identity: Identity,
    pub password_hash: String,
}

#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    users: RwLock<HashMap<Uuid, UserRecord>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: UserRecord) {
        self.users.write().await.insert(record.identity.id, record);
    }

    pub async fn remove(&self, user_id: Uuid) -> bool {
        self.users.write().await.remove(&user_id).is_some()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_id(&self, user_id: Uuid) -> RepoResult<Option<Identity>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).map(|r| r.identity.clone()))
    }
}

#[derive(Debug)]
pub struct MemoryListingStore {
    rows: RwLock<BTreeMap<i64, ListingRow>>,
    next_id: AtomicI64,
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect<F>(&self, keep: F) -> Vec<ListingRow>
    where
        F: Fn(&ListingRow) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .rev()
            .filter(|row| keep(row))
            .cloned()
            .collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn list(&self, category: Option<&str>) -> RepoResult<Vec<ListingRow>> {
        Ok(self
            .collect(|row| match category {
                Some(c) => row.category.as_deref() == Some(c),
                None => true,
            })
            .await)
    }

    async fn search(&self, term: &str) -> RepoResult<Vec<ListingRow>> {
        Ok(self
            .collect(|row| {
                contains_ignore_case(&row.title, term)
                    || row
                        .category
                        .as_deref()
                        .is_some_and(|c| contains_ignore_case(c, term))
            })
            .await)
    }

    async fn find_by_id(&self, listing_id: i64) -> RepoResult<Option<ListingRow>> {
        Ok(self.rows.read().await.get(&listing_id).cloned())
    }

    async fn create(&self, listing: NewListing) -> RepoResult<ListingRow> {
        let listing_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let now = Utc::now();

        let row = ListingRow {
            listing_id,
            creator_id: listing.creator_id,
            category: listing.category,
            kind: listing.kind,
            street_address: listing.street_address,
            apt_suite: listing.apt_suite,
            city: listing.city,
            province: listing.province,
            country: listing.country,
            guest_count: listing.guest_count,
            bedroom_count: listing.bedroom_count,
            bed_count: listing.bed_count,
            bathroom_count: listing.bathroom_count,
            amenities: listing.amenities,
            listing_photo_paths: listing.listing_photo_paths,
            title: listing.title,
            description: listing.description,
            highlight: listing.highlight,
            highlight_desc: listing.highlight_desc,
            price: listing.price,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.insert(listing_id, row.clone());
        Ok(row)
    }

    async fn save(&self, listing: &ListingRow) -> RepoResult<Option<ListingRow>> {
        let mut rows = self.rows.write().await;
        let Some(stored) = rows.get_mut(&listing.listing_id) else {
            return Ok(None);
        };

        let creator_id = stored.creator_id;
        let created_at = stored.created_at;
        *stored = ListingRow {
            creator_id,
            created_at,
            updated_at: Utc::now(),
            ..listing.clone()
        };

        Ok(Some(stored.clone()))
    }

    async fn delete(&self, listing_id: i64) -> RepoResult<bool> {
        Ok(self.rows.write().await.remove(&listing_id).is_some())
    }
}
