//! Cache demo: the same query runs twice, hitting the store only once.

use std::num::NonZeroUsize;
use userdb::seed::seed_sample;
use userdb::{Client, QueryCache};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = Client::connect_env()?;
    seed_sample(client.store())?;

    let cache = QueryCache::new(NonZeroUsize::new(32).unwrap());
    let scope = client.scope();

    for round in 1..=2 {
        let opened_before = client.stats().connections_opened;
        let users = cache.get_or_fetch("users older than 40", || {
            scope.run(|conn| conn.fetch_older_than(40))
        })?;
        let fetched = client.stats().connections_opened - opened_before;

        println!(
            "round {}: {} users ({})",
            round,
            users.len(),
            if fetched > 0 { "fetched" } else { "cached" }
        );
        for user in users.iter() {
            println!("  {}", user);
        }
    }

    println!("{}", client.stats());
    Ok(())
}
