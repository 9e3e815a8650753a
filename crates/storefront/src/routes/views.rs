//! Display data shared by several pages.
//!
//! Views carry preformatted strings so templates stay free of formatting
//! logic.

use prostore_core::format::{format_date, format_date_time};
use prostore_core::pagination::{Page, PageSlot, page_window};
use prostore_core::pricing::OrderPrices;
use prostore_core::{MAX_CART_QUANTITY, ShippingAddress};

use crate::models::{CartLine, OrderItem, Product};

/// Product card for grids.
#[derive(Clone)]
pub struct ProductCardView {
    pub slug: String,
    pub name: String,
    pub brand: String,
    pub image: String,
    pub price: String,
    pub rating: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductCardView {
    fn from(product: &Product) -> Self {
        Self {
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.clone(),
            image: product.primary_image().to_owned(),
            price: product.price.to_string(),
            rating: format!("{:.1}", product.rating),
            in_stock: product.in_stock(),
        }
    }
}

/// A cart line as shown in the cart table and the review step.
#[derive(Clone)]
pub struct CartLineView {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub image: String,
    pub price: String,
    pub line_total: String,
    pub quantity: u32,
    pub decrease_to: u32,
    pub increase_to: u32,
    /// Another unit fits under both stock and the per-line cap.
    pub can_increase: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            slug: line.slug.clone(),
            name: line.name.clone(),
            image: line.image.clone(),
            price: line.price.to_string(),
            line_total: line.line_total().to_string(),
            quantity: line.quantity,
            decrease_to: line.quantity.saturating_sub(1),
            increase_to: line.quantity + 1,
            can_increase: line.quantity < MAX_CART_QUANTITY && line.quantity < line.stock,
        }
    }
}

/// Items, shipping, tax, and total.
#[derive(Clone)]
pub struct PricesView {
    pub items: String,
    pub shipping: String,
    pub tax: String,
    pub total: String,
    pub ships_free: bool,
}

impl From<&OrderPrices> for PricesView {
    fn from(prices: &OrderPrices) -> Self {
        Self {
            items: prices.items.to_string(),
            shipping: prices.shipping.to_string(),
            tax: prices.tax.to_string(),
            total: prices.total.to_string(),
            ships_free: prices.ships_free(),
        }
    }
}

/// Address block lines.
#[derive(Clone)]
pub struct AddressView {
    pub full_name: String,
    pub street: String,
    pub locality: String,
    pub country: String,
}

impl From<&ShippingAddress> for AddressView {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            full_name: address.full_name.clone(),
            street: address.address.clone(),
            locality: format!("{}, {} {}", address.city, address.state, address.postal_code),
            country: address.country.clone(),
        }
    }
}

/// A line on an order page.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub image: String,
    pub price: String,
    pub quantity: u32,
    pub line_total: String,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.name.clone(),
            image: item.image.clone(),
            price: item.price.to_string(),
            quantity: item.quantity,
            line_total: item.line_total().to_string(),
        }
    }
}

/// A paid or delivered badge: the timestamp when set.
#[derive(Clone)]
pub struct StatusView {
    pub done: bool,
    pub at: String,
}

impl StatusView {
    #[must_use]
    pub fn new(done: bool, at: Option<chrono::DateTime<chrono::Utc>>) -> Self {
        Self {
            done,
            at: at.map(format_date_time).unwrap_or_default(),
        }
    }
}

/// Short date for table cells.
#[must_use]
pub fn table_date(at: chrono::DateTime<chrono::Utc>) -> String {
    format_date(at)
}

/// Lenient integer query parameter: anything unparsable counts as absent.
#[must_use]
pub fn number_param(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// One entry in a pagination bar.
#[derive(Clone)]
pub struct PageLinkView {
    /// `None` renders an ellipsis.
    pub number: Option<u32>,
    pub href: String,
    pub current: bool,
}

/// Pagination bar for a list page.
#[derive(Clone, Default)]
pub struct PaginationView {
    pub links: Vec<PageLinkView>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub first_row: u64,
    pub last_row: u64,
    pub total: u64,
}

impl PaginationView {
    /// Build links for `page`, using `href` to render each page's URL.
    pub fn new<T>(page: &Page<T>, href: impl Fn(u32) -> String) -> Self {
        let links = page_window(page.page, page.total_pages)
            .into_iter()
            .map(|slot| match slot {
                PageSlot::Number(n) => PageLinkView {
                    number: Some(n),
                    href: href(n),
                    current: n == page.page,
                },
                PageSlot::Ellipsis => PageLinkView {
                    number: None,
                    href: String::new(),
                    current: false,
                },
            })
            .collect();

        Self {
            links,
            prev: (page.page > 1).then(|| href(page.page - 1)),
            next: (page.page < page.total_pages).then(|| href(page.page + 1)),
            first_row: page.first_row(),
            last_row: page.last_row(),
            total: page.total,
        }
    }

    /// Whether there is more than one page.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.links.len() > 1
    }
}
