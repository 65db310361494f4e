//! Authentication commands.

use super::{describe_session, App};
use crate::output::{self, OutputFormat};
use anyhow::Result;
use folio_session::{AuthUser, LoginInput, RegisterInput};
use std::io::{self, Write};

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn signed_in_message(user: &AuthUser) -> String {
    format!("Logged in as {} ({})", user.email, user.role)
}

/// Login with email and password.
pub async fn login(app: &App, format: &OutputFormat) -> Result<()> {
    app.session.hydrate().await;
    if let Some(user) = app.session.user() {
        output::print_success(&format!("Already logged in as {}", user.email), format);
        return Ok(());
    }

    let email = prompt("Email")?;
    if email.is_empty() {
        output::print_error("Email is required", format);
        return Ok(());
    }

    // Prompt for password (hidden)
    let password = rpassword::prompt_password("Password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }

    if *format == OutputFormat::Text {
        println!("Logging in...");
    }

    match app.session.login(&LoginInput { email, password }).await {
        Ok(user) => output::print_success(&signed_in_message(&user), format),
        Err(e) => output::print_error(&format!("Login failed: {}", describe_session(&e)), format),
    }

    Ok(())
}

/// Create an account and sign in.
pub async fn register(app: &App, format: &OutputFormat) -> Result<()> {
    app.session.hydrate().await;
    if let Some(user) = app.session.user() {
        output::print_success(
            &format!("Already logged in as {}; log out first", user.email),
            format,
        );
        return Ok(());
    }

    let name = prompt("Name")?;
    let email = prompt("Email")?;
    if name.is_empty() || email.is_empty() {
        output::print_error("Name and email are required", format);
        return Ok(());
    }

    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password.is_empty() {
        output::print_error("Password is required", format);
        return Ok(());
    }
    if password != confirm {
        output::print_error("Passwords do not match", format);
        return Ok(());
    }

    match app
        .session
        .register(&RegisterInput {
            name,
            email,
            password,
        })
        .await
    {
        Ok(user) => output::print_success(&signed_in_message(&user), format),
        Err(e) => output::print_error(
            &format!("Registration failed: {}", describe_session(&e)),
            format,
        ),
    }

    Ok(())
}

/// Logout and clear the session.
pub fn logout(app: &App, format: &OutputFormat) -> Result<()> {
    app.session.logout();
    output::print_success("Logged out successfully", format);
    Ok(())
}

/// Check authentication status.
pub async fn status(app: &App, format: &OutputFormat) -> Result<()> {
    app.session.hydrate().await;
    let snapshot = app.session.snapshot();

    match format {
        OutputFormat::Text => {
            println!("API:      {}", app.api.base_url());
            match &snapshot.user {
                Some(user) => {
                    println!("Auth:     logged in");
                    println!("Name:     {}", user.name);
                    println!("Email:    {}", user.email);
                    println!("Role:     {}", user.role);
                }
                None => println!("Auth:     not logged in"),
            }
            println!("Cached download tokens: {}", app.tokens.entries().len());
        }
        OutputFormat::Json => output::print_json(&snapshot),
    }

    Ok(())
}
