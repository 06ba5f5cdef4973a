//! Terminal output.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use emporium_storefront::api::types::{Address, Category, Order, Product};
use emporium_storefront::cart::{Cart, CartNotice};
use emporium_storefront::session::UserIdentity;

/// Print a confirmation line.
pub fn notice(notice: &CartNotice) {
    println!("{notice}");
}

/// Print a plain message.
pub fn message(text: &str) {
    println!("{text}");
}

/// Print an error message to stderr.
pub fn failure(text: &str) {
    eprintln!("error: {text}");
}

pub fn user(user: &UserIdentity) {
    println!("{} <{}> (id {}, {:?})", user.display_name(), user.email, user.id, user.role);
}

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for p in products {
        println!("{:>6}  {:<40} {:>10}  ({} in stock)", p.id, p.name, p.price, p.inventory);
    }
}

pub fn product(product: &Product) {
    println!("{} (#{})", product.name, product.id);
    if let Some(brand) = &product.brand {
        println!("  Brand:     {brand}");
    }
    if let Some(category) = &product.category {
        println!("  Category:  {}", category.name);
    }
    println!("  Price:     {}", product.price);
    println!("  Inventory: {}", product.inventory);
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn page_footer(current: u32, total: u32) {
    println!("-- page {} of {} --", current.saturating_add(1), total.max(1));
}

pub fn categories(categories: &[Category]) {
    for c in categories {
        println!("{:>4}  {}", c.id, c.name);
    }
}

pub fn cart(cart: &Cart) {
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for line in cart.lines() {
        println!(
            "{:>6}  {:<40} {:>3} x {:>10} = {:>10}",
            line.product_id,
            line.name,
            line.quantity,
            line.unit_price,
            line.line_total()
        );
    }
    println!("{} item(s), subtotal {}", cart.total_quantity(), cart.subtotal());
}

pub fn orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders yet");
        return;
    }
    for o in orders {
        let date = o
            .order_date
            .map_or_else(String::new, |d| d.format("%Y-%m-%d").to_string());
        println!(
            "{:>6}  {:<10}  {:<10} {:>10}  {} item(s)",
            o.id,
            date,
            o.status,
            o.total_amount,
            o.items.len()
        );
    }
}

pub fn order(order: &Order) {
    println!("Order {} is now {}", order.id, order.status);
}

pub fn addresses(addresses: &[Address]) {
    if addresses.is_empty() {
        println!("No saved addresses");
        return;
    }
    for a in addresses {
        let id = a.id.map_or_else(|| "-".to_string(), |id| id.to_string());
        let mut flags = Vec::new();
        if a.default_shipping {
            flags.push("default shipping");
        }
        if a.default_billing {
            flags.push("default billing");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", flags.join(", "))
        };
        println!("{id:>4}  {}{flags}", a.summary());
    }
}
