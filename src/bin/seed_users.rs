//! Seed the store with sample users, or with a CSV file given via
//! `USERDB_SEED_CSV`, then print the table.

use userdb::seed::{seed_from_csv, seed_sample};
use userdb::Client;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = Client::connect_env()?;
    println!(
        "[{}] connected to {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        client.config().to_url()
    );

    let loaded = match std::env::var("USERDB_SEED_CSV") {
        Ok(path) => seed_from_csv(client.store(), &path)?,
        Err(_) => seed_sample(client.store())?,
    };
    println!("{} rows loaded", loaded);

    let users = client.scope().run(|conn| conn.fetch_all())?;
    for user in &users {
        println!("{}", serde_json::to_string(user)?);
    }

    println!("{}", client.stats());
    Ok(())
}
