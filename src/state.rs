/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - listings store, photo store, id_codec, auth (verifier + identity resolver)
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::repos::listing_repo::ListingStore;
use crate::repos::user_repo::IdentityStore;
use crate::services::{auth::AuthService, id_codec::IdCodec, uploads::PhotoStore};

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<dyn ListingStore>,
    // Read-only: used to show creator profiles next to listings
    pub identities: Arc<dyn IdentityStore>,
    pub photos: Arc<dyn PhotoStore>,
    pub id_codec: IdCodec,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        identities: Arc<dyn IdentityStore>,
        photos: Arc<dyn PhotoStore>,
        id_codec: IdCodec,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            listings,
            identities,
            photos,
            id_codec,
            auth,
        }
    }
}
