//! Catalog browsing. Reads go straight to the cached API client.

use emporium_core::ProductId;
use emporium_storefront::Shop;

use crate::error::CliError;
use crate::output;

pub async fn products(
    shop: &Shop,
    category: Option<&str>,
    page: Option<u32>,
    limit: u32,
) -> Result<(), CliError> {
    match (category, page) {
        (Some(category), Some(page)) => {
            let page = shop.api().products_page(category, page, limit).await?;
            output::products(&page.items);
            output::page_footer(page.current_page, page.total_pages);
        }
        (Some(category), None) => {
            output::products(&shop.api().products_by_category(category).await?);
        }
        (None, _) => output::products(&shop.api().products().await?),
    }
    Ok(())
}

pub async fn product(shop: &Shop, id: ProductId) -> Result<(), CliError> {
    output::product(&shop.api().product(id).await?);
    Ok(())
}

pub async fn search(shop: &Shop, query: &str, page: u32, limit: u32) -> Result<(), CliError> {
    let results = shop.api().search_products(query, page, limit).await?;
    output::products(&results.items);
    output::page_footer(results.current_page, results.total_pages);
    Ok(())
}

pub async fn categories(shop: &Shop) -> Result<(), CliError> {
    output::categories(&shop.api().categories().await?);
    Ok(())
}
