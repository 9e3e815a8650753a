//! Catalog product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use prostore_core::{Money, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// URL segment, unique across the catalog.
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    /// Units on hand.
    pub stock: u32,
    /// Image URLs; the first is the primary image.
    pub images: Vec<String>,
    pub is_featured: bool,
    pub banner: Option<String>,
    pub price: Money,
    /// Average review score, 0 to 5.
    pub rating: Decimal,
    pub num_reviews: u32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, or an empty string when the product has none.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }
}
