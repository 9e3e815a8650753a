//! Product catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use prostore_core::{Money, ProductId};

use super::{RepositoryError, map_unique_violation, to_count, to_u32};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, name, slug, category, brand, description, stock, images, \
     is_featured, banner, price, rating, num_reviews, created_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    category: String,
    brand: String,
    description: String,
    stock: i32,
    images: Vec<String>,
    is_featured: bool,
    banner: Option<String>,
    price: Decimal,
    rating: Decimal,
    num_reviews: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            category: row.category,
            brand: row.brand,
            description: row.description,
            stock: to_u32(row.stock, "stock")?,
            images: row.images,
            is_featured: row.is_featured,
            banner: row.banner,
            price: Money::new(row.price),
            rating: row.rating,
            num_reviews: to_u32(row.num_reviews, "num_reviews")?,
            created_at: row.created_at,
        })
    }
}

/// Fields for inserting or replacing a catalog entry.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub stock: u32,
    pub images: Vec<String>,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub price: Money,
    pub rating: Decimal,
    pub num_reviews: u32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest products first, for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest(&self, limit: u32) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Look up a product by its URL slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Look up a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Insert a product, or update the existing one with the same slug.
    ///
    /// Returns the product ID and whether a new row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_slug(
        &self,
        input: &ProductInput,
    ) -> Result<(ProductId, bool), RepositoryError> {
        let (id, inserted): (ProductId, bool) = sqlx::query_as(
            r"
            INSERT INTO products (id, name, slug, category, brand, description, stock,
                                  images, is_featured, banner, price, rating, num_reviews)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (slug) DO UPDATE SET
                name = EXCLUDED.name,
                category = EXCLUDED.category,
                brand = EXCLUDED.brand,
                description = EXCLUDED.description,
                stock = EXCLUDED.stock,
                images = EXCLUDED.images,
                is_featured = EXCLUDED.is_featured,
                banner = EXCLUDED.banner,
                price = EXCLUDED.price,
                rating = EXCLUDED.rating,
                num_reviews = EXCLUDED.num_reviews
            RETURNING id, (xmax = 0) AS inserted
            ",
        )
        .bind(ProductId::new())
        .bind(&input.name)
        .bind(&input.slug)
        .bind(&input.category)
        .bind(&input.brand)
        .bind(&input.description)
        .bind(i32::try_from(input.stock).unwrap_or(i32::MAX))
        .bind(&input.images)
        .bind(input.is_featured)
        .bind(input.banner.as_deref())
        .bind(input.price.amount())
        .bind(input.rating)
        .bind(i32::try_from(input.num_reviews).unwrap_or(i32::MAX))
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product"))?;

        Ok((id, inserted))
    }

    /// Count all products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.pool)
            .await?;
        Ok(to_count(count))
    }
}
