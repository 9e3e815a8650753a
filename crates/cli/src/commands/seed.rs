//! Seed the catalog from a YAML file.
//!
//! Products are matched by slug: new slugs are inserted, existing ones are
//! overwritten with the file's values. The whole file is validated before
//! the database is touched.
//!
//! ```yaml
//! products:
//!   - name: Polo Sporting Stretch Shirt
//!     slug: polo-sporting-stretch-shirt
//!     category: Men's Dress Shirts
//!     brand: Polo
//!     description: Classic Polo style with modern comfort
//!     stock: 5
//!     price: "59.99"
//!     rating: 4.5
//!     num_reviews: 10
//!     is_featured: true
//!     images:
//!       - /static/images/p1-1.jpg
//! ```

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use prostore_core::{Money, ProductInputError, validate_price_text, validate_product_text};
use prostore_storefront::db::ProductRepository;
use prostore_storefront::db::products::ProductInput;

/// Top-level seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub products: Vec<SeedProduct>,
}

/// One product as written in the seed file.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub slug: String,
    pub category: String,
    pub brand: String,
    pub description: String,
    pub stock: i64,
    /// Quoted decimal string so the two-place rule can be checked.
    pub price: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub num_reviews: u32,
}

impl SeedProduct {
    /// Check the catalog rules and build the repository input.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn to_input(&self) -> Result<ProductInput, ProductInputError> {
        validate_product_text("Name", &self.name)?;
        validate_product_text("Slug", &self.slug)?;
        validate_product_text("Category", &self.category)?;
        validate_product_text("Brand", &self.brand)?;
        validate_product_text("Description", &self.description)?;

        let stock = u32::try_from(self.stock).map_err(|_| ProductInputError::NegativeStock)?;

        if self.images.iter().all(|image| image.trim().is_empty()) {
            return Err(ProductInputError::NoImages);
        }

        let price = self.price.trim();
        validate_price_text(price)?;
        let price = Decimal::from_str(price).map_err(|_| ProductInputError::InvalidPrice)?;

        let rating = Decimal::try_from(self.rating)
            .unwrap_or_default()
            .round_dp(2)
            .clamp(Decimal::ZERO, Decimal::from(5));

        Ok(ProductInput {
            name: self.name.trim().to_owned(),
            slug: self.slug.trim().to_owned(),
            category: self.category.trim().to_owned(),
            brand: self.brand.trim().to_owned(),
            description: self.description.trim().to_owned(),
            stock,
            images: self
                .images
                .iter()
                .map(|image| image.trim().to_owned())
                .filter(|image| !image.is_empty())
                .collect(),
            is_featured: self.is_featured,
            banner: self.banner.clone().filter(|b| !b.trim().is_empty()),
            price: Money::new(price),
            rating,
            num_reviews: self.num_reviews,
        })
    }
}

/// Validate every product, collecting one message per failure.
///
/// Duplicate slugs within the file are reported too.
pub fn validate_catalog(catalog: &CatalogFile) -> Result<Vec<ProductInput>, Vec<String>> {
    let mut inputs = Vec::with_capacity(catalog.products.len());
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (index, product) in catalog.products.iter().enumerate() {
        let position = index + 1;
        if !seen.insert(product.slug.trim()) {
            errors.push(format!("product {position} ({}): duplicate slug", product.slug));
        }
        match product.to_input() {
            Ok(input) => inputs.push(input),
            Err(e) => errors.push(format!("product {position} ({}): {e}", product.slug)),
        }
    }

    if errors.is_empty() {
        Ok(inputs)
    } else {
        Err(errors)
    }
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, any product fails
/// validation, or a database operation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog: CatalogFile = serde_yaml::from_str(&content)?;

    info!(products = catalog.products.len(), "Parsed catalog");

    let inputs = match validate_catalog(&catalog) {
        Ok(inputs) => inputs,
        Err(errors) => {
            error!("Catalog validation failed:");
            for err in &errors {
                error!("  - {err}");
            }
            return Err(format!("{} validation errors found", errors.len()).into());
        }
    };

    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    let mut inserted = 0_usize;
    let mut updated = 0_usize;
    for input in &inputs {
        let (id, is_new) = repo.upsert_by_slug(input).await?;
        if is_new {
            inserted += 1;
        } else {
            updated += 1;
        }
        tracing::debug!(product_id = %id, slug = %input.slug, is_new, "Seeded product");
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products updated: {updated}");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const VALID: &str = r#"
products:
  - name: Polo Sporting Stretch Shirt
    slug: polo-sporting-stretch-shirt
    category: Men's Dress Shirts
    brand: Polo
    description: Classic Polo style with modern comfort
    stock: 5
    price: "59.99"
    rating: 4.5
    num_reviews: 10
    images:
      - /static/images/p1-1.jpg
"#;

    #[test]
    fn test_valid_catalog() {
        let catalog: CatalogFile = serde_yaml::from_str(VALID).unwrap();
        let inputs = validate_catalog(&catalog).unwrap();
        assert_eq!(inputs.len(), 1);
        let input = &inputs[0];
        assert_eq!(input.slug, "polo-sporting-stretch-shirt");
        assert_eq!(input.stock, 5);
        assert_eq!(input.price, Money::from_cents(5_999));
        assert_eq!(input.rating, Decimal::new(45, 1));
        assert!(!input.is_featured);
    }

    #[test]
    fn test_rules_reported_per_product() {
        let yaml = r#"
products:
  - name: Ok Shirt
    slug: ok-shirt
    category: Shirts
    brand: Brand
    description: Fine
    stock: -1
    price: "10.00"
    images: [/a.jpg]
  - name: Ok Shirt
    slug: ok-shirt
    category: Shirts
    brand: Brand
    description: Fine
    stock: 1
    price: "10.5"
    images: []
"#;
        let catalog: CatalogFile = serde_yaml::from_str(yaml).unwrap();
        let errors = validate_catalog(&catalog).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("Stock must be a non-negative number"));
        assert!(errors[1].contains("duplicate slug"));
        assert!(errors[2].contains("At least one image is required"));
    }

    #[test]
    fn test_price_must_have_two_decimals() {
        let mut catalog: CatalogFile = serde_yaml::from_str(VALID).unwrap();
        catalog.products[0].price = "59.9".to_owned();
        let err = catalog.products[0].to_input().unwrap_err();
        assert_eq!(err, ProductInputError::InvalidPrice);
    }
}
