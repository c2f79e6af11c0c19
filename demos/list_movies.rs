//! Lists movies page by page, sorted by Academy Award wins.
//!
//! This example shows how to:
//! - Build a client from an API key in the environment
//! - Drive paging by hand with `set_limit` / `set_page`
//! - Decode the `docs` envelope into your own type
//!
//! Run with: `LOTR_API_KEY=... cargo run --example list_movies`

use lotr::{Client, Error, Page};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Movie {
    name: String,
    #[serde(rename = "academyAwardWins")]
    academy_award_wins: u32,
    #[serde(rename = "boxOfficeRevenueInMillions")]
    box_office_revenue_in_millions: f64,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("lotr=debug,list_movies=info")
        .init();

    let api_key = std::env::var("LOTR_API_KEY")
        .map_err(|_| Error::ConfigurationError("LOTR_API_KEY is not set".to_string()))?;
    let mut client = Client::new(api_key)?;

    client.set_limit(3);
    client.set_sort("academyAwardWins", "desc");

    let mut page = 1;
    loop {
        client.set_page(page);
        let movies = client.get_movies::<Page<Movie>>().await?;

        println!("=== Page {} of {:?} ({:?}) ===", page, movies.pages, movies.latency);
        for movie in &movies.docs {
            println!(
                "{:<40} {:>3} awards  ${:>7.1}M",
                movie.name, movie.academy_award_wins, movie.box_office_revenue_in_millions
            );
        }

        if !movies.has_more() {
            break;
        }
        page += 1;
    }

    Ok(())
}
