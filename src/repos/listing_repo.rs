/*
 * Responsibility
 * - listings の CRUD (一覧 / 検索 / 取得 / 作成 / 保存 / 削除)
 * - "creatorId" は INSERT 時のみ書き込む (UPDATE 対象に含めない)
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repos::error::RepoResult;
use crate::services::auth::ownership::Owned;

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ListingRow {
    #[sqlx(rename = "listingId")]
    pub listing_id: i64,

    #[sqlx(rename = "creatorId")]
    pub creator_id: Uuid,

    pub category: Option<String>,
    #[sqlx(rename = "type")]
    pub kind: Option<String>,

    #[sqlx(rename = "streetAddress")]
    pub street_address: String,
    #[sqlx(rename = "aptSuite")]
    pub apt_suite: Option<String>,
    pub city: String,
    pub province: String,
    pub country: String,

    #[sqlx(rename = "guestCount")]
    pub guest_count: i32,
    #[sqlx(rename = "bedroomCount")]
    pub bedroom_count: i32,
    #[sqlx(rename = "bedCount")]
    pub bed_count: i32,
    #[sqlx(rename = "bathroomCount")]
    pub bathroom_count: i32,

    pub amenities: Vec<String>,
    #[sqlx(rename = "listingPhotoPaths")]
    pub listing_photo_paths: Vec<String>,

    pub title: String,
    pub description: String,
    pub highlight: String,
    #[sqlx(rename = "highlightDesc")]
    pub highlight_desc: String,
    pub price: f64,

    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Owned for ListingRow {
    fn owner_id(&self) -> Uuid {
        self.creator_id
    }
}

/// Everything needed to insert a listing. Ids and timestamps come from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub creator_id: Uuid,
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
    pub listing_photo_paths: Vec<String>,
    pub title: String,
    pub description: String,
    pub highlight: String,
    pub highlight_desc: String,
    pub price: f64,
}

#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Newest first, optionally restricted to one category.
    async fn list(&self, category: Option<&str>) -> RepoResult<Vec<ListingRow>>;

    /// Case-insensitive substring match on category or title.
    async fn search(&self, term: &str) -> RepoResult<Vec<ListingRow>>;

    async fn find_by_id(&self, listing_id: i64) -> RepoResult<Option<ListingRow>>;

    async fn create(&self, listing: NewListing) -> RepoResult<ListingRow>;

    /// Persist the mutable fields of `listing`. `None` if the row vanished meanwhile.
    async fn save(&self, listing: &ListingRow) -> RepoResult<Option<ListingRow>>;

    async fn delete(&self, listing_id: i64) -> RepoResult<bool>;
}

const LISTING_COLUMNS: &str = r#"
    "listingId", "creatorId", category, "type",
    "streetAddress", "aptSuite", city, province, country,
    "guestCount", "bedroomCount", "bedCount", "bathroomCount",
    amenities, "listingPhotoPaths",
    title, description, highlight, "highlightDesc", price,
    "createdAt", "updatedAt"
"#;

// ILIKE treats % and _ as wildcards; search terms are matched literally.
fn like_pattern(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[derive(Clone, Debug)]
pub struct PgListingRepo {
    pool: PgPool,
}

impl PgListingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingStore for PgListingRepo {
    async fn list(&self, category: Option<&str>) -> RepoResult<Vec<ListingRow>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE $1::text IS NULL OR category = $1
            ORDER BY "listingId" DESC
            "#
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn search(&self, term: &str) -> RepoResult<Vec<ListingRow>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE category ILIKE $1 ESCAPE '\' OR title ILIKE $1 ESCAPE '\'
            ORDER BY "listingId" DESC
            "#
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(like_pattern(term))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_by_id(&self, listing_id: i64) -> RepoResult<Option<ListingRow>> {
        let sql = format!(
            r#"
            SELECT {LISTING_COLUMNS}
            FROM listings
            WHERE "listingId" = $1
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(listing_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn create(&self, listing: NewListing) -> RepoResult<ListingRow> {
        let sql = format!(
            r#"
            INSERT INTO listings (
                "creatorId", category, "type",
                "streetAddress", "aptSuite", city, province, country,
                "guestCount", "bedroomCount", "bedCount", "bathroomCount",
                amenities, "listingPhotoPaths",
                title, description, highlight, "highlightDesc", price
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(listing.creator_id)
            .bind(listing.category)
            .bind(listing.kind)
            .bind(listing.street_address)
            .bind(listing.apt_suite)
            .bind(listing.city)
            .bind(listing.province)
            .bind(listing.country)
            .bind(listing.guest_count)
            .bind(listing.bedroom_count)
            .bind(listing.bed_count)
            .bind(listing.bathroom_count)
            .bind(listing.amenities)
            .bind(listing.listing_photo_paths)
            .bind(listing.title)
            .bind(listing.description)
            .bind(listing.highlight)
            .bind(listing.highlight_desc)
            .bind(listing.price)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    async fn save(&self, listing: &ListingRow) -> RepoResult<Option<ListingRow>> {
        // Last write wins: there is no version column to compare against.
        let sql = format!(
            r#"
            UPDATE listings
            SET
                category = $2,
                "type" = $3,
                "streetAddress" = $4,
                "aptSuite" = $5,
                city = $6,
                province = $7,
                country = $8,
                "guestCount" = $9,
                "bedroomCount" = $10,
                "bedCount" = $11,
                "bathroomCount" = $12,
                amenities = $13,
                "listingPhotoPaths" = $14,
                title = $15,
                description = $16,
                highlight = $17,
                "highlightDesc" = $18,
                price = $19,
                "updatedAt" = now()
            WHERE "listingId" = $1
            RETURNING {LISTING_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(listing.listing_id)
            .bind(&listing.category)
            .bind(&listing.kind)
            .bind(&listing.street_address)
            .bind(&listing.apt_suite)
            .bind(&listing.city)
            .bind(&listing.province)
            .bind(&listing.country)
            .bind(listing.guest_count)
            .bind(listing.bedroom_count)
            .bind(listing.bed_count)
            .bind(listing.bathroom_count)
            .bind(&listing.amenities)
            .bind(&listing.listing_photo_paths)
            .bind(&listing.title)
            .bind(&listing.description)
            .bind(&listing.highlight)
            .bind(&listing.highlight_desc)
            .bind(listing.price)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn delete(&self, listing_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM listings
            WHERE "listingId" = $1
            "#,
        )
        .bind(listing_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
