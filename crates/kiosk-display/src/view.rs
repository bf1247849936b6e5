//! View model for the product screen.

use serde::Serialize;

use kiosk_core::constants::{NOT_AVAILABLE, PLACEHOLDER_IMAGE_SIZED, SHIFT_LABEL};
use kiosk_core::{ProductEvent, ProductStatus, format_date};

/// Display strings derived from the current product.
///
/// Only built while the product screen is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    /// Entry date as a Spanish long date.
    pub date: String,
    pub name: String,
    pub code: String,
    /// Net weight followed by its unit.
    pub weight: String,
    pub pieces: String,
    pub area: String,
    /// Fixed shift label; no event field carries it.
    pub shift: &'static str,
    pub image: String,
    pub entry_time: String,
    pub operator: String,
    pub status: ProductStatus,
}

impl ProductView {
    pub fn from_event(event: &ProductEvent) -> Self {
        let product = &event.product;
        Self {
            date: format_date(&product.entry_date),
            name: product.name.clone(),
            code: product.product_code.clone(),
            weight: format!("{} {}", product.net_weight, product.unit_of_measure),
            pieces: or_fallback(&product.pieces, NOT_AVAILABLE),
            area: product.area.clone(),
            shift: SHIFT_LABEL,
            image: or_fallback(&product.image_url, PLACEHOLDER_IMAGE_SIZED),
            entry_time: product.entry_time.clone(),
            operator: product.operator.clone(),
            status: product.status,
        }
    }
}

fn or_fallback(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
