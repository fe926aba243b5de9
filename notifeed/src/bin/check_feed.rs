// Fetch one feed URL and print what a sync run would see.
// Usage: check_feed <url>

use notifeed::blocks::HtmlBlockConverter;
use notifeed::entry;
use notifeed::ingestion;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let url = match std::env::args().nth(1) {
        Some(url) => url,
        None => {
            eprintln!("Usage: check_feed <url>");
            std::process::exit(1);
        }
    };

    match ingestion::fetch_and_parse_feed(&url, 10).await {
        Ok(feed) => {
            println!("Link checked: {}", url);
            println!("Number of entries: {}", feed.entries.len());

            let Some(first) = feed.entries.first() else {
                println!("Feed has no entries");
                return;
            };

            match entry::normalize(first, "check") {
                Ok(normalized) => {
                    println!("Content type: {}", normalized.body_kind.label());
                    println!();
                    println!("First entry:");
                    println!("  Title: {}", normalized.title);
                    println!("  Author: {}", normalized.author);
                    println!("  Date: {}", normalized.published_canonical());
                    println!("  Link: {}", normalized.link);

                    let blocks = HtmlBlockConverter::new(true).convert(&normalized.body_html);
                    println!("  Blocks: {}", blocks.len());
                    for block in blocks.iter().take(5) {
                        println!("    {:?}", block);
                    }
                }
                Err(reason) => println!("First entry would be skipped: {}", reason),
            }
        }
        Err(e) => {
            eprintln!("Failed to check {}: {}", url, e);
            std::process::exit(1);
        }
    }
}
