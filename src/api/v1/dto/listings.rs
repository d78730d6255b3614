/*
 * Responsibility
 * - Listings の request/response DTO (JSON は camelCase)
 * - 公開 ID は encode 済みの値を返す (内部 ID を漏らさない)
 * - 更新は許可したフィールドだけを受け付ける (id / creator は書き換え不可)
 */
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::repos::listing_repo::{ListingRow, NewListing};
use crate::repos::user_repo::Identity;

const MAX_TEXT_LEN: usize = 2000;

// Tri-state for nullable text columns:
// - None: field missing (do not update)
// - Some(None): null or blank (clear)
// - Some(Some(v)): set trimmed value
fn nullable_text<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(de)?;
    Ok(Some(
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()),
    ))
}

fn check_text(value: &str, field: &'static str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} cannot be empty"));
    }
    if value.len() > MAX_TEXT_LEN {
        return Err(format!("{field} must be <= {MAX_TEXT_LEN} chars"));
    }
    Ok(())
}

fn check_count(value: i32, field: &'static str) -> Result<(), String> {
    if value < 0 {
        return Err(format!("{field} must be >= 0"));
    }
    Ok(())
}

fn check_price(value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err("price must be a non-negative number".to_string());
    }
    Ok(())
}

/// Create form, assembled from the text parts of the multipart body.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateListingRequest {
    pub category: Option<String>,
    pub kind: Option<String>,
    pub street_address: String,
    pub apt_suite: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub guest_count: i32,
    pub bedroom_count: i32,
    pub bed_count: i32,
    pub bathroom_count: i32,
    pub amenities: Vec<String>,
    pub title: String,
    pub description: String,
    pub highlight: String,
    pub highlight_desc: String,
    pub price: f64,
}

impl CreateListingRequest {
    /// Build from multipart text fields. `amenities` may repeat; every other
    /// field keeps its last value. A client-sent `creator` is ignored: the
    /// creator is whoever is authenticated.
    pub fn from_fields(fields: &HashMap<String, Vec<String>>) -> Result<Self, String> {
        let last = |name: &str| {
            fields
                .get(name)
                .and_then(|values| values.last())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| last(name).ok_or(format!("{name} is required"));
        let count = |name: &'static str| -> Result<i32, String> {
            required(name)?
                .parse::<i32>()
                .map_err(|_| format!("{name} must be an integer"))
        };

        let price = required("price")?
            .parse::<f64>()
            .map_err(|_| "price must be a number".to_string())?;

        let amenities = fields
            .get("amenities")
            .map(|values| {
                values
                    .iter()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            category: last("category"),
            kind: last("type"),
            street_address: required("streetAddress")?,
            apt_suite: last("aptSuite"),
            city: required("city")?,
            province: required("province")?,
            country: required("country")?,
            guest_count: count("guestCount")?,
            bedroom_count: count("bedroomCount")?,
            bed_count: count("bedCount")?,
            bathroom_count: count("bathroomCount")?,
            amenities,
            title: required("title")?,
            description: last("description").unwrap_or_default(),
            highlight: last("highlight").unwrap_or_default(),
            highlight_desc: last("highlightDesc").unwrap_or_default(),
            price,
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        check_text(&self.street_address, "streetAddress")?;
        check_text(&self.city, "city")?;
        check_text(&self.province, "province")?;
        check_text(&self.country, "country")?;
        check_text(&self.title, "title")?;
        check_count(self.guest_count, "guestCount")?;
        check_count(self.bedroom_count, "bedroomCount")?;
        check_count(self.bed_count, "bedCount")?;
        check_count(self.bathroom_count, "bathroomCount")?;
        check_price(self.price)
    }

    pub fn into_new_listing(self, creator_id: Uuid, listing_photo_paths: Vec<String>) -> NewListing {
        NewListing {
            creator_id,
            category: self.category,
            kind: self.kind,
            street_address: self.street_address,
            apt_suite: self.apt_suite,
            city: self.city,
            province: self.province,
            country: self.country,
            guest_count: self.guest_count,
            bedroom_count: self.bedroom_count,
            bed_count: self.bed_count,
            bathroom_count: self.bathroom_count,
            amenities: self.amenities,
            listing_photo_paths,
            title: self.title,
            description: self.description,
            highlight: self.highlight,
            highlight_desc: self.highlight_desc,
            price: self.price,
        }
    }
}

/// Partial update. Only the fields declared here can change; any other key
/// (`id`, `creator`, `creatorId`, `listingPhotoPaths`, ...) rejects the body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateListingRequest {
    #[serde(default, deserialize_with = "nullable_text")]
    pub category: Option<Option<String>>,
    #[serde(rename = "type", default, deserialize_with = "nullable_text")]
    pub kind: Option<Option<String>>,
    pub street_address: Option<String>,
    #[serde(default, deserialize_with = "nullable_text")]
    pub apt_suite: Option<Option<String>>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub guest_count: Option<i32>,
    pub bedroom_count: Option<i32>,
    pub bed_count: Option<i32>,
    pub bathroom_count: Option<i32>,
    pub amenities: Option<Vec<String>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub highlight: Option<String>,
    pub highlight_desc: Option<String>,
    pub price: Option<f64>,
}

impl UpdateListingRequest {
    pub fn validate(&self) -> Result<(), String> {
        let texts = [
            (&self.street_address, "streetAddress"),
            (&self.city, "city"),
            (&self.province, "province"),
            (&self.country, "country"),
            (&self.title, "title"),
        ];
        for (value, field) in texts {
            if let Some(v) = value {
                check_text(v, field)?;
            }
        }

        let counts = [
            (self.guest_count, "guestCount"),
            (self.bedroom_count, "bedroomCount"),
            (self.bed_count, "bedCount"),
            (self.bathroom_count, "bathroomCount"),
        ];
        for (value, field) in counts {
            if let Some(v) = value {
                check_count(v, field)?;
            }
        }

        if let Some(price) = self.price {
            check_price(price)?;
        }
        let blank_amenity = self
            .amenities
            .iter()
            .flatten()
            .any(|a| a.trim().is_empty());
        if blank_amenity {
            return Err("amenities cannot contain empty entries".to_string());
        }

        Ok(())
    }

    /// Merge the present fields into `listing`. Identity and ownership columns
    /// are not reachable from here.
    pub fn apply(self, listing: &mut ListingRow) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *slot = v;
            }
        }

        set(&mut listing.category, self.category);
        set(&mut listing.kind, self.kind);
        set(&mut listing.street_address, self.street_address);
        set(&mut listing.apt_suite, self.apt_suite);
        set(&mut listing.city, self.city);
        set(&mut listing.province, self.province);
        set(&mut listing.country, self.country);
        set(&mut listing.guest_count, self.guest_count);
        set(&mut listing.bedroom_count, self.bedroom_count);
        set(&mut listing.bed_count, self.bed_count);
        set(&mut listing.bathroom_count, self.bathroom_count);
        set(&mut listing.amenities, self.amenities);
        set(&mut listing.title, self.title);
        set(&mut listing.description, self.description);
        set(&mut listing.highlight, self.highlight);
        set(&mut listing.highlight_desc, self.highlight_desc);
        set(&mut listing.price, self.price);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: String, // encoded
    pub creator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Identity>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub street_address: String,
    pub apt_suite: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,
    pub guest_count: i32,
    pub bedroom_count: i32,
    pub bed_count: i32,
    pub bathroom_count: i32,
    pub amenities: Vec<String>,
    pub listing_photo_paths: Vec<String>,
    pub title: String,
    pub description: String,
    pub highlight: String,
    pub highlight_desc: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ListingResponse {
    pub fn from_row(public_id: String, row: ListingRow, creator: Option<Identity>) -> Self {
        Self {
            id: public_id,
            creator_id: row.creator_id,
            creator,
            category: row.category,
            kind: row.kind,
            street_address: row.street_address,
            apt_suite: row.apt_suite,
            city: row.city,
            province: row.province,
            country: row.country,
            guest_count: row.guest_count,
            bedroom_count: row.bedroom_count,
            bed_count: row.bed_count,
            bathroom_count: row.bathroom_count,
            amenities: row.amenities,
            listing_photo_paths: row.listing_photo_paths,
            title: row.title,
            description: row.description,
            highlight: row.highlight,
            highlight_desc: row.highlight_desc,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteListingResponse {
    pub message: &'static str,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}
