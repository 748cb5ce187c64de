//! Command handlers.
//!
//! Every handler goes through `StorefrontStore`, so the CLI exercises the
//! same streams, slots and generation checks a screen would.

use std::path::Path;

use anyhow::{bail, Context};
use serde::Serialize;

use vetrina_client::{
    AccountSession, ClientConfig, LoadOutcome, PageFetcher, ResourceStream, StorefrontStore,
};
use vetrina_core::language::SUPPORTED_LANGUAGES;
use vetrina_core::{
    CategoryScope, Credentials, PasswordReset, ProfileChanges, ProfileImage, Registration,
    StreamSnapshot, User,
};

use crate::{Cli, Command};

pub async fn run(cli: Cli, config: ClientConfig) -> anyhow::Result<()> {
    let json = cli.json;

    if let Command::Config = cli.command {
        let rendered = toml::to_string_pretty(&config.redacted())
            .context("Failed to render configuration")?;
        print!("{}", rendered);
        return Ok(());
    }

    if let Command::Languages = cli.command {
        if json {
            return print_json(&SUPPORTED_LANGUAGES);
        }
        for language in SUPPORTED_LANGUAGES {
            println!("{:<4} {}", language.code, language.name);
        }
        return Ok(());
    }

    let store = StorefrontStore::new(&config)?;

    match cli.command {
        Command::Categories { pages } => {
            let snapshot = drain(store.categories(), CategoryScope, pages).await?;
            if json {
                return print_json(&snapshot);
            }
            for category in &snapshot.items {
                println!("{}", category.name);
            }
            print_footer(&snapshot);
        }

        Command::Subcategories { category, pages } => {
            let scope = store.subcategory_scope(&category)?;
            let snapshot = drain(store.subcategories(), scope, pages).await?;
            if json {
                return print_json(&snapshot);
            }
            for sub in &snapshot.items {
                println!("{:<32} {}", sub.collection_name, sub.name);
            }
            print_footer(&snapshot);
        }

        Command::Products {
            collection,
            lang,
            sort,
            pages,
        } => {
            if let Some(lang) = lang {
                store.set_language(&lang)?;
            }
            let mut scope = store.product_scope(&collection)?;
            if let Some(sort) = sort {
                scope = scope.with_sort(sort);
            }

            let snapshot = drain(store.products(), scope, pages).await?;
            if json {
                return print_json(&snapshot);
            }
            for product in &snapshot.items {
                println!(
                    "{:<14} {:>12}  {}",
                    product.product_id, product.price, product.name
                );
            }
            print_footer(&snapshot);
        }

        Command::Featured { lang, limit } => {
            if let Some(lang) = lang {
                store.set_language(&lang)?;
            }
            check(store.featured().load(store.featured_scope(limit)).await)?;

            let snapshot = store.featured().snapshot();
            if json {
                return print_json(&snapshot);
            }
            let Some(featured) = snapshot.value else {
                bail!("No featured products loaded");
            };
            println!(
                "{} / {} ({})",
                featured.category, featured.subcategory, featured.collection_name
            );
            for product in &featured.products {
                println!("  {:<14} {}", product.product_id, product.name);
            }
            println!("-- {} of {} products", featured.products.len(), featured.total);
        }

        Command::Product { item_code, lang } => {
            if let Some(lang) = lang {
                store.set_language(&lang)?;
            }
            check(store.product_detail().load(item_code).await)?;

            let snapshot = store.product_detail().snapshot();
            if json {
                return print_json(&snapshot);
            }
            let Some(detail) = snapshot.value else {
                bail!("No product loaded");
            };
            let lang = store.language().code;

            println!("{}  ({})", detail.product_id, detail.catalogue);
            println!("GTIN:       {}", detail.gtin);
            println!("List price: {:.2}", detail.list_price);
            if let Some(short) = detail.short_description(lang) {
                println!("\n{}", short);
            }
            if let Some(long) = detail.long_description(lang) {
                println!("\n{}", long);
            }
            let attributes: Vec<(&str, String)> = detail.attributes().collect();
            if !attributes.is_empty() {
                println!();
                for (name, value) in attributes {
                    println!("{:<28} {}", name, value);
                }
            }
        }

        Command::Login { email, password } => {
            let account = store.account();
            check(account.login(Credentials::new(email, password.password)).await)?;
            print_user(account, json)?;
        }

        Command::Register {
            first_name,
            last_name,
            email,
            password,
            phone,
            address,
        } => {
            let mut registration =
                Registration::new(first_name, last_name, email, password.password);
            if let Some(phone) = phone {
                registration = registration.with_phone(phone);
            }
            if let Some(address) = address {
                registration = registration.with_address(address);
            }

            let account = store.account();
            check(account.register(registration).await)?;
            print_user(account, json)?;
        }

        Command::ForgotPassword { email } => {
            let message = store.account().forgot_password(&email).await?;
            println!("{}", message);
        }

        Command::ResetPassword { otp, password } => {
            let message = store
                .account()
                .reset_password(PasswordReset::new(otp, password.password))
                .await?;
            println!("{}", message);
        }

        Command::UpdateProfile {
            email,
            password,
            first_name,
            last_name,
            phone,
            address,
            image,
        } => {
            let mut changes = ProfileChanges::new();
            if let Some(value) = first_name {
                changes = changes.first_name(value);
            }
            if let Some(value) = last_name {
                changes = changes.last_name(value);
            }
            if let Some(value) = phone {
                changes = changes.phone(value);
            }
            if let Some(value) = address {
                changes = changes.address(value);
            }
            if changes.is_empty() && image.is_none() {
                bail!("Nothing to update: pass at least one field or --image");
            }
            let image = match image {
                Some(path) => Some(read_image(&path).await?),
                None => None,
            };

            let account = store.account();
            check(account.login(Credentials::new(email, password.password)).await)?;
            check(account.update_profile(changes, image).await)?;
            print_user(account, json)?;
        }

        Command::Languages | Command::Config => {}
    }

    Ok(())
}

/// Loads up to `pages` pages of `scope` (0 means no bound).
async fn drain<F: PageFetcher>(
    stream: &ResourceStream<F>,
    scope: F::Scope,
    pages: u32,
) -> anyhow::Result<StreamSnapshot<F::Item, F::Scope>> {
    check(stream.load_pages(scope, pages).await)?;
    Ok(stream.snapshot())
}

async fn read_image(path: &Path) -> anyhow::Result<ProfileImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ProfileImage::new(file_name, bytes)?)
}

fn print_user(account: &AccountSession, json: bool) -> anyhow::Result<()> {
    let Some(user) = account.user() else {
        bail!("Not signed in");
    };
    if json {
        return print_json(&user);
    }
    print_user_table(&user);
    Ok(())
}

fn print_user_table(user: &User) {
    println!("{}  (id {})", user.full_name(), user.id);
    println!("Email:   {}", user.email);
    if let Some(phone) = &user.phone {
        println!("Phone:   {}", phone);
    }
    if let Some(address) = &user.address {
        println!("Address: {}", address);
    }
    if let Some(url) = user.profile_image_url.as_ref().or(user.profile_image.as_ref()) {
        println!("Picture: {}", url);
    }
}

fn check(outcome: LoadOutcome) -> anyhow::Result<()> {
    match outcome {
        LoadOutcome::Failed(message) => bail!(message),
        LoadOutcome::Stale => bail!("Request was superseded"),
        LoadOutcome::Applied | LoadOutcome::Skipped => Ok(()),
    }
}

fn print_footer<T, K>(snapshot: &StreamSnapshot<T, K>) {
    let more = if snapshot.has_more { ", more available" } else { "" };
    println!("-- {} of {}{}", snapshot.items.len(), snapshot.total, more);
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
