//! Runs a filtered character search and shows how errors surface.
//!
//! Filters are read from a JSON file in the documented
//! `{"key", "filter_type", "value"}` shape when a path is given, otherwise a
//! built-in set is used.
//!
//! Run with: `LOTR_API_KEY=... cargo run --example filtered_characters [filters.json]`

use lotr::{Client, Error, FilterDescriptor, FilterOperator, Page};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("lotr=debug,filtered_characters=info")
        .init();

    let api_key = std::env::var("LOTR_API_KEY")
        .map_err(|_| Error::ConfigurationError("LOTR_API_KEY is not set".to_string()))?;
    let mut client = Client::new(api_key)?;

    let filters = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| Error::ConfigurationError(format!("Cannot read {path}: {e}")))?;
            serde_json::from_str::<Vec<FilterDescriptor>>(&text)
                .map_err(|e| Error::ConfigurationError(format!("Bad filter file {path}: {e}")))?
        }
        None => vec![
            FilterDescriptor::new("race", FilterOperator::Include, "Hobbit,Human"),
            FilterDescriptor::new("hair", FilterOperator::NotMatch, "Blonde"),
            FilterDescriptor::new("name", FilterOperator::RegexMatch, "king"),
        ],
    };

    client.set_limit(3);
    client.set_filters(filters);
    println!("Requesting {}", client.url_for("/character"));

    match client.get_characters::<Page>().await {
        Ok(characters) => {
            println!("{} matching characters, {:?} pages", characters.total, characters.pages);
            for character in &characters.docs {
                println!("  {}", character["name"]);
            }
        }
        Err(Error::ServerError { status, raw_response }) => {
            eprintln!("The One API is having trouble ({status}): {raw_response}");
        }
        Err(e) if e.is_rate_limited() => {
            eprintln!("Still rate limited after retrying: {e}");
        }
        Err(e) => return Err(e),
    }

    println!("=== An invalid id never reaches the network ===");
    match client.get_character::<Page>("not an id").await {
        Err(Error::InvalidIdentifier(id)) => println!("rejected {id:?}"),
        other => println!("unexpected: {:?}", other.map(|r| r.status)),
    }

    Ok(())
}
