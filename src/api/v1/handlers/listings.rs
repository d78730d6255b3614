/*
 * Responsibility
 * - /listings 系 handler
 * - Path の {listing_id} は公開 ID → extractor で復号化して内部 ID として受け取る
 * - 更新/削除は AuthCtx の主体と listing の creator を ownership guard で照合してから実行
 * - creator は token から決める (body の creator は信用しない)
 */
use std::collections::HashMap;

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    api::v1::{
        dto::listings::{
            CreateListingRequest, DeleteListingResponse, ListQuery, ListingResponse,
            UpdateListingRequest,
        },
        extractors::{AuthCtxExtractor, PublicListingId},
    },
    error::AppError,
    repos::{listing_repo::ListingRow, user_repo::Identity},
    services::{
        auth::ownership::{self, Mutation},
        uploads::UploadedPhoto,
    },
    state::AppState,
};

const LISTING: &str = "listing";
const PHOTO_FIELD: &str = "listingPhotos";
const SEARCH_ALL: &str = "all";

fn to_response(
    state: &AppState,
    row: ListingRow,
    creator: Option<Identity>,
) -> Result<ListingResponse, AppError> {
    let public_id = state.id_codec.encode(row.listing_id)?;
    Ok(ListingResponse::from_row(public_id, row, creator))
}

async fn with_creators(
    state: &AppState,
    rows: Vec<ListingRow>,
) -> Result<Vec<ListingResponse>, AppError> {
    // One lookup per distinct creator
    let mut creators: HashMap<Uuid, Option<Identity>> = HashMap::new();
    let mut res = Vec::with_capacity(rows.len());

    for row in rows {
        let creator = match creators.get(&row.creator_id) {
            Some(found) => found.clone(),
            None => {
                let found = state.identities.find_by_id(row.creator_id).await?;
                creators.insert(row.creator_id, found.clone());
                found
            }
        };
        res.push(to_response(state, row, creator)?);
    }

    Ok(res)
}

// Best effort: a failed removal is logged, the original error still wins.
async fn discard_photos(state: &AppState, paths: &[String]) {
    for path in paths {
        if let Err(e) = state.photos.remove(path).await {
            tracing::warn!(error = %e, path = %path, "failed to remove orphaned photo");
        }
    }
}

pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let category = query.category.as_deref().filter(|c| !c.trim().is_empty());
    let rows = state.listings.list(category).await?;

    Ok(Json(with_creators(&state, rows).await?))
}

pub async fn search_listings(
    State(state): State<AppState>,
    Path(search): Path<String>,
) -> Result<Json<Vec<ListingResponse>>, AppError> {
    let rows = if search.eq_ignore_ascii_case(SEARCH_ALL) {
        state.listings.list(None).await?
    } else {
        state.listings.search(&search).await?
    };

    Ok(Json(with_creators(&state, rows).await?))
}

pub async fn get_listing(
    State(state): State<AppState>,
    listing_id: PublicListingId,
) -> Result<Json<ListingResponse>, AppError> {
    let row = state
        .listings
        .find_by_id(listing_id.id)
        .await?
        .ok_or(AppError::not_found(LISTING))?;

    let creator = state.identities.find_by_id(row.creator_id).await?;
    Ok(Json(to_response(&state, row, creator)?))
}

pub async fn create_listing(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ListingResponse>), AppError> {
    let mut multipart = multipart?;

    let mut fields: HashMap<String, Vec<String>> = HashMap::new();
    let mut photos = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == PHOTO_FIELD {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field.bytes().await?;
            if !bytes.is_empty() {
                photos.push(UploadedPhoto { file_name, bytes });
            }
        } else {
            let value = field.text().await?;
            fields.entry(name).or_default().push(value);
        }
    }

    let req = CreateListingRequest::from_fields(&fields)
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;

    if photos.is_empty() {
        return Err(AppError::bad_request(
            "NO_PHOTO",
            "at least one listing photo is required",
        ));
    }

    let mut paths = Vec::with_capacity(photos.len());
    for photo in photos {
        match state.photos.store(photo).await {
            Ok(path) => paths.push(path),
            Err(e) => {
                discard_photos(&state, &paths).await;
                return Err(e.into());
            }
        }
    }

    let new_listing = req.into_new_listing(ctx.user_id(), paths.clone());
    let row = match state.listings.create(new_listing).await {
        Ok(row) => row,
        Err(e) => {
            discard_photos(&state, &paths).await;
            return Err(e.into());
        }
    };

    tracing::info!(listing_id = row.listing_id, creator_id = %row.creator_id, "listing created");

    let res = to_response(&state, row, Some(ctx.identity))?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn update_listing(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    listing_id: PublicListingId,
    payload: Result<Json<UpdateListingRequest>, JsonRejection>,
) -> Result<Json<ListingResponse>, AppError> {
    let existing = state.listings.find_by_id(listing_id.id).await?;
    let mut listing = ownership::authorize(existing, ctx.user_id(), LISTING, Mutation::Update)?;

    // Body errors only surface once the caller may touch this listing
    let Json(req) = payload?;
    req.validate()
        .map_err(|msg| AppError::bad_request("VALIDATION_ERROR", msg))?;
    req.apply(&mut listing);

    // Deleted between load and save
    let saved = state
        .listings
        .save(&listing)
        .await?
        .ok_or(AppError::not_found(LISTING))?;

    tracing::info!(listing_id = saved.listing_id, actor_id = %ctx.user_id(), "listing updated");

    Ok(Json(to_response(&state, saved, Some(ctx.identity))?))
}

pub async fn delete_listing(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    listing_id: PublicListingId,
) -> Result<Json<DeleteListingResponse>, AppError> {
    let existing = state.listings.find_by_id(listing_id.id).await?;
    let listing = ownership::authorize(existing, ctx.user_id(), LISTING, Mutation::Delete)?;

    if !state.listings.delete(listing.listing_id).await? {
        return Err(AppError::not_found(LISTING));
    }

    tracing::info!(listing_id = listing.listing_id, actor_id = %ctx.user_id(), "listing deleted");

    Ok(Json(DeleteListingResponse {
        message: "listing deleted",
        id: state.id_codec.encode(listing.listing_id)?,
    }))
}
