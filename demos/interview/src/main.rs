use anyhow::{Context, Result};
use otoshelf::config::ShelfConfig;
use otoshelf::core::store::JsonShelfStore;
use otoshelf::core::types::SongDetails;
use otoshelf::core::{Bookshelf, InterviewFlow};
use otoshelf::genai::GeminiProvider;
use otoshelf::init_logging;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let title = std::env::args().nth(1).unwrap_or_else(|| "Imagine".to_string());
    let artist = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "John Lennon".to_string());

    let api_key = std::env::var("GEMINI_API_KEY")
        .context("GEMINI_API_KEY is required to run the interview demo")?;
    let config = ShelfConfig::builder().api_key(api_key).build();
    let provider = Arc::new(GeminiProvider::new(
        config.require_api_key().context("missing api key")?,
    ));

    let store = Arc::new(
        JsonShelfStore::new(".otoshelf/demo_shelf.json").context("failed to open shelf store")?,
    );
    let mut shelf = Bookshelf::load(store);

    let mut flow = InterviewFlow::new(provider, &config);
    let stream = flow
        .begin_interview(SongDetails {
            title: title.clone(),
            artist: artist.clone(),
            release_year: String::new(),
        })
        .context("failed to start the interview")?;

    println!("--- interview: {title} / {artist} ---");
    print_streamed(&mut flow, stream).await;

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            break;
        };
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "/done" {
            break;
        }

        let stream = match flow.begin_exchange(trimmed) {
            Ok(stream) => stream,
            Err(err) => {
                eprintln!("send rejected: {err}");
                continue;
            }
        };
        print_streamed(&mut flow, stream).await;
    }

    println!("--- summarizing ---");
    flow.request_summary()
        .await
        .context("failed to summarize")?;
    println!("summary: {}", flow.summary());
    println!("tags: {}", flow.tags().join(", "));

    let draft = flow.finish().context("failed to finish the interview")?;
    let id = shelf.upsert(draft);
    println!("saved record {id}; shelf now holds {} records", shelf.len());

    Ok(())
}

/// Drive one reply stream, printing deltas as they arrive.
async fn print_streamed(flow: &mut InterviewFlow, stream: otoshelf::genai::ReplyStream) {
    let mut printed = 0usize;
    flow.stream_reply(stream, |accumulated| {
        let delta = &accumulated[printed..];
        if !delta.is_empty() {
            if let Err(err) = io::stdout().write_all(delta.as_bytes()) {
                eprintln!("failed to write delta: {err}");
            }
            let _ = io::stdout().flush();
        }
        printed = accumulated.len();
    })
    .await;
    println!();
}
