//! Account commands.
//!
//! # Environment Variables
//!
//! - `EMPORIUM_PASSWORD` - Password for `login` and `register` when `--password` is not given
//! - `EMPORIUM_PASSWORD_CONFIRM` - Password confirmation for `register`

use secrecy::SecretString;

use emporium_storefront::Shop;
use emporium_storefront::checkout::Registration;

use crate::error::CliError;
use crate::output;

pub async fn login(shop: &Shop, email: &str, password: String) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let user = shop.login(email.trim(), &password).await?;
    output::message(&format!("Welcome back, {}", user.display_name()));
    output::cart(&shop.cart());
    Ok(())
}

pub async fn logout(shop: &Shop) -> Result<(), CliError> {
    shop.logout().await?;
    output::message("Logged out");
    Ok(())
}

pub async fn register(shop: &Shop, form: Registration) -> Result<(), CliError> {
    let user = shop.register(form).await?;
    output::message(&format!(
        "Account created for {}. Log in to continue.",
        user.email
    ));
    Ok(())
}

pub fn whoami(shop: &Shop) {
    match shop.whoami() {
        Some(user) => output::user(&user),
        None => output::message("Not logged in"),
    }
}

pub async fn profile(shop: &Shop, first_name: &str, last_name: &str) -> Result<(), CliError> {
    let updated = shop.update_profile(first_name, last_name).await?;
    output::message(&format!(
        "Name updated to {} {}",
        updated.first_name, updated.last_name
    ));
    Ok(())
}
