//! Booky CLI - browse books and discussion threads from the terminal.
//!
//! Thin command-line front end over the `booky` client library: login with
//! optional remember-me, list books and threads, like a thread.

use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use booky::config::DEFAULT_BASE_URL;
use booky::models::UserProfile;
use booky::{ApiClient, Config, CredentialStore, FileSessionStore};

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!("Usage: booky <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  register             create a new account");
    eprintln!("  login [--remember]   log in (optionally store the password in the OS keychain)");
    eprintln!("  logout               log out and clear the local session");
    eprintln!("  whoami               show the logged-in user");
    eprintln!("  books                list the book catalog");
    eprintln!("  book <id>            show a book and its discussion threads");
    eprintln!("  threads              list discussion threads");
    eprintln!("  thread <id>          show a single thread");
    eprintln!("  like <id>            toggle the like on a thread");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    let mut config = Config::load()?;
    let base_url = std::env::var("BOOKY_BASE_URL")
        .ok()
        .or_else(|| config.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    debug!(base_url = %base_url, "using backend");

    let store = FileSessionStore::new(config.cache_dir()?);
    let client = ApiClient::new(&base_url, Box::new(store))?;

    match command {
        "register" => register(&client).await,
        "login" => {
            let remember = args.iter().any(|a| a == "--remember");
            login(&client, &mut config, remember).await
        }
        "logout" => logout(&client, &config).await,
        "whoami" => {
            let user = ensure_session(&client, &config).await?;
            println!("{} <{}>", user.display_name(), user.email);
            Ok(())
        }
        "books" => list_books(&client).await,
        "book" => show_book(&client, parse_id(&args)?).await,
        "threads" => list_threads(&client).await,
        "thread" => show_thread(&client, parse_id(&args)?).await,
        "like" => {
            ensure_session(&client, &config).await?;
            let status = client.like_thread(parse_id(&args)?).await?;
            println!(
                "{} ({} likes)",
                if status.liked { "liked" } else { "unliked" },
                status.likes_count
            );
            Ok(())
        }
        _ => {
            usage();
            Ok(())
        }
    }
}

fn parse_id(args: &[String]) -> Result<i64> {
    args.get(2)
        .context("missing id argument")?
        .parse()
        .context("id must be a number")
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn register(client: &ApiClient) -> Result<()> {
    let email = prompt("Email")?;
    let username = prompt("Username (optional)")?;
    let password = rpassword::prompt_password("Password: ")?;

    let username = if username.is_empty() {
        None
    } else {
        Some(username.as_str())
    };
    client.register(&email, &password, username).await?;

    println!("Account created - run `booky login` to sign in");
    Ok(())
}

async fn login(client: &ApiClient, config: &mut Config, remember: bool) -> Result<()> {
    let email = match config.last_email.clone() {
        Some(saved) => {
            let entered = prompt(&format!("Email [{saved}]"))?;
            if entered.is_empty() {
                saved
            } else {
                entered
            }
        }
        None => prompt("Email")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    let user = client.session().login(&email, &password).await?;
    info!(email = %user.email, "logged in");

    if remember {
        let credentials = CredentialStore::default();
        if let Err(err) = credentials.store(&email, &password) {
            warn!(error = %err, "could not store password in keychain");
        }
    }
    client.session().set_remember_me(remember);

    config.last_email = Some(email);
    config.remember_me = remember;
    config.save()?;

    println!("Logged in as {}", user.display_name());
    Ok(())
}

async fn logout(client: &ApiClient, config: &Config) -> Result<()> {
    client.logout().await;
    if let Some(ref email) = config.last_email {
        // drop the remembered password along with the session
        let _ = CredentialStore::default().delete(email);
    }
    println!("Logged out");
    Ok(())
}

/// Make sure an authenticated session exists: rehydrate the persisted one
/// and revalidate it, falling back to remembered credentials.
///
/// The cookie jar lives in process memory, so the refresh cookie from a
/// previous invocation is gone by the time this runs. Across invocations
/// recovery goes through the keychain fallback; the refresh path matters
/// within a single long-running process.
async fn ensure_session(client: &ApiClient, config: &Config) -> Result<UserProfile> {
    let session = client.session();

    if session.hydrate() {
        match session.refresh_session().await {
            Ok(true) => {}
            Ok(false) | Err(_) => {
                // The durable cookie did not survive; try the keychain
                if session.remember_me() {
                    if let Some(ref email) = config.last_email {
                        if let Ok(password) = CredentialStore::default().get_password(email) {
                            debug!("re-authenticating with remembered credentials");
                            session.login(email, &password).await?;
                        }
                    }
                }
            }
        }
    }

    session
        .snapshot()
        .user
        .filter(|_| session.is_authenticated())
        .context("not logged in - run `booky login`")
}

async fn list_books(client: &ApiClient) -> Result<()> {
    let books = client.fetch_books().await?;
    for book in &books {
        println!(
            "{:>5}  {}  {}",
            book.id,
            book.title,
            book.author.as_deref().unwrap_or("-")
        );
    }
    println!("{} books", books.len());
    Ok(())
}

async fn show_book(client: &ApiClient, book_id: i64) -> Result<()> {
    let (book, threads) = client.fetch_book_with_threads(book_id).await?;
    println!("{} ({})", book.title, book.author.as_deref().unwrap_or("-"));
    if let Some(ref description) = book.description {
        println!("\n{description}");
    }
    println!("\nThreads:");
    for thread in &threads {
        println!("  {:>5}  {}  ({} likes)", thread.id, thread.title, thread.likes_count);
    }
    Ok(())
}

async fn list_threads(client: &ApiClient) -> Result<()> {
    let threads = client.fetch_threads().await?;
    for thread in &threads {
        let author = thread
            .user
            .as_ref()
            .map(|u| u.display_name().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {}  by {}  ({} likes)",
            thread.id, thread.title, author, thread.likes_count
        );
    }
    println!("{} threads", threads.len());
    Ok(())
}

async fn show_thread(client: &ApiClient, thread_id: i64) -> Result<()> {
    let thread = client.fetch_thread(thread_id).await?;
    println!("{}", thread.title);
    if let Some(ref user) = thread.user {
        println!("by {}", user.display_name());
    }
    if let Some(created) = thread.created_at {
        println!("on {}", created.format("%Y-%m-%d %H:%M"));
    }
    println!("\n{}", thread.content.as_deref().unwrap_or(""));
    println!("\n{} likes", thread.likes_count);
    Ok(())
}
