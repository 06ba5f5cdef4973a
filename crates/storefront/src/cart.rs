//! Local shopping cart state.
//!
//! [`Cart`] is the plain value persisted under the `cart` key. Every mutation
//! checks the inventory cap before touching any line, so a rejected call
//! leaves the cart exactly as it was. Nothing in here talks to the backend.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use emporium_core::{Price, ProductId};

use crate::api::types::{Category, Image};

/// Schema version of the persisted cart blob.
pub const CART_SCHEMA_VERSION: u32 = 1;

/// A product as offered to the cart, with an optional requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    /// Units in stock when the product was read.
    pub inventory: u32,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Requested quantity; `None` or zero means one.
    #[serde(default)]
    pub quantity: Option<u32>,
}

impl CartProduct {
    /// Request `quantity` units of this product.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub(crate) fn requested_quantity(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub unit_price: Price,
    pub inventory_cap: u32,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub category: Option<Category>,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Confirmation of a successful cart mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartNotice {
    Added { name: String },
    QuantityUpdated { name: String },
    Removed { name: String },
}

impl fmt::Display for CartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { name } => write!(f, "Product {name} added to cart"),
            Self::QuantityUpdated { name } => write!(f, "{name} quantity updated"),
            Self::Removed { name } => write!(f, "Item {name} removed"),
        }
    }
}

/// A cart mutation refused by a business rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartRejection {
    #[error("Not enough stock. Only {available} left in stock")]
    InsufficientStock { available: u32 },
}

/// The local cart: ordered lines, unique by product, plus the sync gate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
    has_synced_once: bool,
}

impl Cart {
    /// Add `product` (its requested quantity, default one) to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartRejection::InsufficientStock` if the resulting quantity
    /// would exceed `product.inventory`; the cart is unchanged.
    pub fn add(&mut self, product: &CartProduct) -> Result<CartNotice, CartRejection> {
        let requested = product.requested_quantity();
        let position = self.position(product.id);
        let current = position
            .and_then(|i| self.lines.get(i))
            .map_or(0, |line| line.quantity);
        let new_quantity = current.saturating_add(requested);

        if new_quantity > product.inventory {
            return Err(CartRejection::InsufficientStock {
                available: product.inventory,
            });
        }

        if let Some(line) = position.and_then(|i| self.lines.get_mut(i)) {
            line.quantity = new_quantity;
            line.inventory_cap = product.inventory;
            return Ok(CartNotice::QuantityUpdated {
                name: product.name.clone(),
            });
        }

        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            unit_price: product.price,
            inventory_cap: product.inventory,
            quantity: new_quantity,
            image: product.image.clone(),
            category: product.category.clone(),
        });
        Ok(CartNotice::Added {
            name: product.name.clone(),
        })
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// Returns `Ok(None)` when no line matches `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `CartRejection::InsufficientStock` if `quantity` exceeds the
    /// line's inventory cap; the cart is unchanged.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Option<CartNotice>, CartRejection> {
        let Some(index) = self.position(product_id) else {
            return Ok(None);
        };

        if quantity == 0 {
            let line = self.lines.remove(index);
            return Ok(Some(CartNotice::Removed { name: line.name }));
        }

        let Some(line) = self.lines.get_mut(index) else {
            return Ok(None);
        };
        if quantity > line.inventory_cap {
            return Err(CartRejection::InsufficientStock {
                available: line.inventory_cap,
            });
        }
        line.quantity = quantity;
        Ok(Some(CartNotice::QuantityUpdated {
            name: line.name.clone(),
        }))
    }

    /// Drop the line for `product_id`, if present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        self.position(product_id).map(|i| self.lines.remove(i))
    }

    /// Empty the cart. The sync gate is left alone.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Replace every line wholesale.
    pub fn set_lines(&mut self, lines: Vec<CartLine>) {
        self.lines = lines;
    }

    pub const fn mark_synced(&mut self) {
        self.has_synced_once = true;
    }

    pub const fn reset_sync(&mut self) {
        self.has_synced_once = false;
    }

    #[must_use]
    pub const fn has_synced_once(&self) -> bool {
        self.has_synced_once
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of all line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines.iter().position(|l| l.product_id == product_id)
    }
}
