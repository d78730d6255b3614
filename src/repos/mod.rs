/*
 * Responsibility
 * - store trait (IdentityStore / ListingStore) と実装の公開
 * - Postgres 実装は本番用、memory 実装はテストとローカル確認用
 */
pub mod error;
pub mod listing_repo;
pub mod memory;
pub mod user_repo;

pub use listing_repo::{ListingRow, ListingStore, NewListing, PgListingRepo};
pub use memory::{MemoryIdentityStore, MemoryListingStore, UserRecord};
pub use user_repo::{Identity, IdentityStore, PgUserRepo};
