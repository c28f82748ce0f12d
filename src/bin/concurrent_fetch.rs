//! Concurrency demo: fetch all users and users above the age threshold at
//! the same time, each query on its own handle.

use userdb::concurrent::{fetch_concurrently, DEFAULT_AGE_THRESHOLD};
use userdb::seed::seed_sample;
use userdb::Client;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = Client::connect_env()?;
    seed_sample(client.store())?;

    let (all, older) = fetch_concurrently(client.store(), DEFAULT_AGE_THRESHOLD).await?;

    println!("all users ({}):", all.len());
    for user in &all {
        println!("  {}", user);
    }

    println!("older than {} ({}):", DEFAULT_AGE_THRESHOLD, older.len());
    for user in &older {
        println!("  {}", user);
    }

    println!("{}", client.stats());
    Ok(())
}
