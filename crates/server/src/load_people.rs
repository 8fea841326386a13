use std::env;

use anyhow::Context;
use knowledge_share::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let db = db::connect(&database_url, 5).await?;

    println!("Connected to database!");

    let seeded = db::setup_database(&db, db::DEFAULT_PEOPLE).await?;
    println!("✓ Schema ready, {} people from the default roster", seeded);

    // Read extra names from file
    let path = env::args().nth(1).unwrap_or_else(|| "people.txt".to_string());
    let roster = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            println!("⊘ No roster file at {} ({}), nothing else to load", path, e);
            return Ok(());
        }
    };

    let mut count = 0;
    let mut skipped = 0;

    for line in roster.lines() {
        let name = line.trim();
        if name.is_empty() || name.starts_with('#') {
            continue;
        }

        match db::insert_person(&db, name).await? {
            Some(id) => {
                count += 1;
                println!("✓ Loaded: {} (id {})", name, id);
            }
            None => {
                skipped += 1;
                println!("⊘ Skipped (duplicate): {}", name);
            }
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Successfully loaded {} new people!", count);
    if skipped > 0 {
        println!("⊘ Skipped {} duplicate names", skipped);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    Ok(())
}
