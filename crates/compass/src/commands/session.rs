use anyhow::{Context, Result};
use colored::Colorize;

use crate::session::SessionStore;

pub fn login(username: Option<String>) -> Result<()> {
    let store = SessionStore::open()?;

    let username = match username {
        Some(u) => u,
        None => inquire::Text::new("Username:")
            .prompt()
            .context("Login cancelled")?,
    };
    let password = inquire::Password::new("Password:")
        .without_confirmation()
        .prompt()
        .context("Login cancelled")?;

    let session = store.login(&username, &password)?;
    println!("{} Signed in as {}", "✓".green().bold(), session.username.bold());
    Ok(())
}

pub fn logout() -> Result<()> {
    let store = SessionStore::open()?;
    if store.logout()? {
        println!("{} Signed out", "✓".green().bold());
    } else {
        println!("{}", "Not signed in.".dimmed());
    }
    Ok(())
}

pub fn whoami() -> Result<()> {
    let store = SessionStore::open()?;
    match store.load() {
        Some(session) => println!("Signed in as {}", session.username.bold()),
        None => println!("{}", "Not signed in.".dimmed()),
    }
    Ok(())
}
