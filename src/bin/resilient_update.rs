//! Retry demo: an update that fails transiently twice before succeeding.
//!
//! The first two attempts fail with a simulated fault, roll back, and wait
//! out the fixed delay; the third commits.

use std::num::NonZeroU32;
use std::time::Duration;
use userdb::seed::seed_sample;
use userdb::{Client, DbError};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let client = Client::connect_env()?;
    seed_sample(client.store())?;

    let first = client
        .scope()
        .run(|conn| conn.fetch_all())?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("store is empty after seeding"))?;
    println!("updating email for {}", first);

    let pipeline = client
        .pipeline()
        .retries(NonZeroU32::new(3).unwrap())
        .delay(Duration::from_millis(500));

    let mut failures = 2;
    let affected = pipeline
        .execute(|conn| {
            if failures > 0 {
                failures -= 1;
                return Err(DbError::ExecutionError("store temporarily offline".into()));
            }
            conn.update_email(first.id, "updated@example.com")
        })
        .await?;
    println!("{} row(s) updated", affected);

    let updated = client.scope().run(|conn| conn.fetch_by_id(first.id))?;
    if let Some(user) = updated {
        println!("now: {}", user);
    }

    println!("{}", client.stats());
    Ok(())
}
