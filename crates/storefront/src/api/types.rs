//! Wire types for the backend REST API.
//!
//! Field names follow the backend's camelCase JSON.

use chrono::NaiveDateTime;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use emporium_core::{
    AddressId, CartId, CartItemId, CategoryId, Email, ImageId, OrderId, OrderStatus, Price,
    ProductId, UserId, UserRole,
};

use crate::cart::{CartLine, CartProduct};
use crate::session::UserIdentity;

// =============================================================================
// Envelopes
// =============================================================================

/// Success envelope: `{ "data": ... }`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

/// Error envelope: `{ "message": "..." }`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: ImageId,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub download_url: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub description: String,
    pub inventory: u32,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
}

impl Product {
    /// The cart-facing view of this product (first image only).
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            inventory: self.inventory,
            image: self.images.first().cloned(),
            category: self.category.clone(),
            quantity: None,
        }
    }
}

/// One page of products: `{ items, currentPage, totalPages }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub items: Vec<Product>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
}

/// Category reference inside product mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub name: String,
}

/// Admin product create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub brand: String,
    pub price: Price,
    pub inventory: u32,
    pub description: String,
    pub long_description: String,
    pub category: CategoryRef,
}

// =============================================================================
// Auth & Users
// =============================================================================

/// Login payload.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Login response, returned without the data envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl AuthResponse {
    /// The identity to store in the session.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            id: self.user_id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
        }
    }
}

/// Refresh response: `{ accessToken }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshResponse {
    pub access_token: String,
}

/// Registration payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// A user as returned by the users endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Name patch for `users/{id}/update`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserUpdateRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
}

// =============================================================================
// Cart
// =============================================================================

/// A line of the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCartItem {
    pub item_id: CartItemId,
    pub quantity: u32,
    pub unit_price: Price,
    #[serde(default)]
    pub total_price: Price,
    pub product: Product,
}

impl From<ServerCartItem> for CartLine {
    fn from(item: ServerCartItem) -> Self {
        let product = item.product;
        Self {
            product_id: product.id,
            name: product.name,
            description: product.description,
            unit_price: item.unit_price,
            inventory_cap: product.inventory,
            quantity: item.quantity,
            image: product.images.into_iter().next(),
            category: product.category,
        }
    }
}

/// The authoritative server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCart {
    pub cart_id: CartId,
    #[serde(default)]
    pub items: Vec<ServerCartItem>,
    #[serde(default)]
    pub total_amount: Price,
}

/// One `(productId, quantity)` pair sent to the merge endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl From<&CartLine> for SyncCartItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            quantity: line.quantity,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncCartRequest<'a> {
    pub items: &'a [SyncCartItem],
}

// =============================================================================
// Addresses
// =============================================================================

/// An address book entry. `id` is absent when creating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AddressId>,
    pub recipient_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
    #[serde(default)]
    pub default_shipping: bool,
    #[serde(default)]
    pub default_billing: bool,
}

impl Address {
    /// One-line summary used in pickers.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{}, {}, {}", self.recipient_name, self.street, self.city)
    }
}

// =============================================================================
// Orders
// =============================================================================

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub product_name: String,
    pub quantity: u32,
    pub price: Price,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub guest_email: Option<String>,
    #[serde(default)]
    pub order_date: Option<NaiveDateTime>,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
}

/// Authenticated checkout: pick two address-book entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
}

/// Product snapshot inside a guest order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    pub inventory: u32,
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

/// A guest order line built from the local cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestOrderItem {
    pub quantity: u32,
    pub unit_price: Price,
    pub total_price: Price,
    pub product: GuestOrderProduct,
}

impl From<&CartLine> for GuestOrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            quantity: line.quantity,
            unit_price: line.unit_price,
            total_price: line.line_total(),
            product: GuestOrderProduct {
                id: line.product_id,
                name: line.name.clone(),
                price: line.unit_price,
                description: line.description.clone(),
                inventory: line.inventory_cap,
                images: line.image.iter().cloned().collect(),
                category: line.category.clone(),
            },
        }
    }
}

/// Unauthenticated checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceGuestOrderRequest {
    pub guest_email: Email,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub items: Vec<GuestOrderItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PaymentIntentRequest {
    pub order_id: OrderId,
}

/// Payment intent handle for the hosted payment widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntent {
    pub client_secret: String,
}

/// A Spring-style page: `{ content, number, size, totalPages, totalElements }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    #[serde(default)]
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_elements: u64,
}
