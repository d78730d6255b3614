//! access token（HS256 JWT）検証 → 主体の解決 → AuthCtx を extensions に入れる
//!
//! - `Authorization: Bearer <jwt>` を受け取り、署名と exp を検証する
//! - sub (または id) から users を引き、password hash を含まない Identity を AuthCtx に載せる
//! - 失敗時は handler に到達させず 401 (store 障害のみ 503)

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// 認証が必要な method だけに access middleware を掛ける。
///
/// 例：
/// ```ignore
/// .route("/listings", get(list_listings).merge(access::apply(post(create_listing), state.clone())))
/// ```
pub fn apply(method_router: MethodRouter<AppState>, state: AppState) -> MethodRouter<AppState> {
    // route_layer: マッチしなかった method (405) には認証を掛けない
    method_router.route_layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // Non UTF-8 header values count as "no credential".
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let authed = match state.auth.authenticate(authorization).await {
        Ok(authed) => authed,
        Err(err) => {
            match &err {
                AuthError::Unauthenticated => {
                    tracing::debug!(path = %req.uri().path(), "no bearer credential")
                }
                AuthError::InvalidCredential(e) => {
                    tracing::warn!(error = %e, "access token verification failed")
                }
                AuthError::IdentityNotFound => {
                    tracing::warn!("access token subject has no identity")
                }
                AuthError::Store(e) => tracing::error!(error = %e, "identity lookup failed"),
            }
            return Err(err.into());
        }
    };

    let auth_ctx = AuthCtx::new(authed.identity, authed.token.expires_at);

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}
