/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /listings を route
 * - Bearer が必要な method (作成/更新/削除) だけに access middleware を掛ける
 *   (同じ path の GET は公開のまま)
 */
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::api::v1::handlers::{
    health::health,
    listings::{
        create_listing, delete_listing, get_listing, list_listings, search_listings,
        update_listing,
    },
};
use crate::middleware::auth::access;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/listings",
            get(list_listings).merge(access::apply(post(create_listing), state.clone())),
        )
        .route("/listings/search/{search}", get(search_listings))
        .route(
            "/listings/{listing_id}",
            get(get_listing).merge(access::apply(
                put(update_listing).merge(delete(delete_listing)),
                state,
            )),
        )
}
