//! Streaming demo: batched reads, lazy pages and an age average, all without
//! materialising the table more than one batch at a time.

use userdb::seed::seed_sample;
use userdb::stream::{average_age, LazyPages, UserBatches};
use userdb::Client;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = Client::connect_env()?;
    seed_sample(client.store())?;

    println!("batches of 3:");
    for (i, batch) in UserBatches::new(client.store(), 3)?.enumerate() {
        let batch = batch?;
        println!("  batch {}: {} rows", i + 1, batch.len());
        for user in &batch {
            println!("    {}", user);
        }
    }

    println!("lazy pages of 4 (one short-lived handle per page):");
    for page in LazyPages::new(client.store(), 4)? {
        println!("  page of {} rows", page?.len());
    }

    println!("average age: {:.1}", average_age(client.store())?);
    println!("{}", client.stats());
    Ok(())
}
