//! Fixture and CSV seeding.
//!
//! `seed_from_csv` loads rows from a `user_id,name,email,age` file (the id
//! column is optional; a v4 uuid is generated when it is absent). Rows whose
//! id already exists are skipped, so seeding is idempotent. A
//! connection-establishment fault is logged and reported as zero rows loaded;
//! statement faults propagate.

use crate::core::{DbError, Result, User};
use crate::store::UserStore;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// Built-in fixture used by the demo binaries when no CSV is supplied.
pub fn sample_users() -> Vec<User> {
    vec![
        User::new("Amara Okafor", "amara.okafor@example.com", 34),
        User::new("Bert Jansen", "bert.jansen@example.com", 67),
        User::new("Chloe Martin", "chloe.martin@example.com", 19),
        User::new("Dmitri Volkov", "dmitri.volkov@example.com", 52),
        User::new("Eve Tanaka", "eve.tanaka@example.com", 41),
        User::new("Farid Haddad", "farid.haddad@example.com", 23),
        User::new("Greta Lindqvist", "greta.lindqvist@example.com", 58),
        User::new("Hugo Alvarez", "hugo.alvarez@example.com", 29),
    ]
}

/// Seed the built-in fixture.
pub fn seed_sample(store: &Arc<UserStore>) -> Result<usize> {
    seed_users(store, sample_users())
}

/// Insert the given rows, skipping ids that already exist.
pub fn seed_users(store: &Arc<UserStore>, users: Vec<User>) -> Result<usize> {
    let mut conn = match store.connect() {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("seed: could not open connection: {}", e);
            return Ok(0);
        }
    };

    let mut loaded = 0;
    for user in users {
        if conn.fetch_by_id(user.id)?.is_some() {
            log::debug!("seed: row {} already present, skipped", user.id);
            continue;
        }
        conn.insert(user)?;
        loaded += 1;
    }
    conn.close();

    log::info!("seed: {} rows loaded", loaded);
    Ok(loaded)
}

/// Load and insert rows from a CSV file.
pub fn seed_from_csv(store: &Arc<UserStore>, path: impl AsRef<Path>) -> Result<usize> {
    let text = std::fs::read_to_string(path)?;
    let users = parse_csv(&text)?;
    seed_users(store, users)
}

fn parse_csv(text: &str) -> Result<Vec<User>> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header = lines
        .next()
        .ok_or_else(|| DbError::ParseError("CSV file is empty".into()))?;
    let columns = split_record(header);
    let find = |name: &str| columns.iter().position(|c| c.trim() == name);

    let id_idx = find("user_id");
    let name_idx =
        find("name").ok_or_else(|| DbError::ParseError("Missing 'name' column".into()))?;
    let email_idx =
        find("email").ok_or_else(|| DbError::ParseError("Missing 'email' column".into()))?;
    let age_idx =
        find("age").ok_or_else(|| DbError::ParseError("Missing 'age' column".into()))?;

    let mut users = Vec::new();
    for (line_no, line) in lines.enumerate() {
        let fields = split_record(line);
        let field = |idx: usize| -> Result<&str> {
            fields.get(idx).map(String::as_str).ok_or_else(|| {
                DbError::ParseError(format!("Row {}: too few fields", line_no + 2))
            })
        };

        let id = match id_idx {
            Some(idx) => Uuid::parse_str(field(idx)?).map_err(|e| {
                DbError::ParseError(format!("Row {}: bad user_id: {}", line_no + 2, e))
            })?,
            None => Uuid::new_v4(),
        };
        let age_text = field(age_idx)?;
        let age: i64 = age_text.trim().parse().map_err(|_| {
            DbError::ParseError(format!("Row {}: bad age '{}'", line_no + 2, age_text))
        })?;

        users.push(User::with_id(id, field(name_idx)?, field(email_idx)?, age));
    }

    Ok(users)
}

/// Split one CSV record, honouring double-quoted fields and "" escapes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);

    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_seed_sample() {
        let store = Arc::new(UserStore::new());

        let loaded = seed_sample(&store).unwrap();
        assert_eq!(loaded, sample_users().len());

        let conn = store.connect().unwrap();
        assert_eq!(conn.count().unwrap(), loaded);
    }

    #[test]
    fn test_seed_skips_existing_rows() {
        let store = Arc::new(UserStore::new());
        let users = sample_users();

        assert_eq!(seed_users(&store, users.clone()).unwrap(), users.len());
        assert_eq!(seed_users(&store, users.clone()).unwrap(), 0);

        let conn = store.connect().unwrap();
        assert_eq!(conn.count().unwrap(), users.len());
    }

    #[test]
    fn test_parse_csv_with_id_column() {
        let text = "user_id,name,email,age\n\
                    00000000-0000-0000-0000-000000000001,Alice,alice@example.com,30\n\
                    00000000-0000-0000-0000-000000000002,Bob,bob@example.com,25\n";

        let users = parse_csv(text).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Alice");
        assert_eq!(users[1].age, 25);
    }

    #[test]
    fn test_parse_csv_without_id_column() {
        let text = "name,email,age\nAlice,alice@example.com,30\n";

        let users = parse_csv(text).unwrap();
        assert_eq!(users.len(), 1);
        assert!(!users[0].id.is_nil());
    }

    #[test]
    fn test_parse_csv_quoted_name() {
        let text = "name,email,age\n\"Jansen, Bert\",bert@example.com,67\n";

        let users = parse_csv(text).unwrap();
        assert_eq!(users[0].name, "Jansen, Bert");
    }

    #[test]
    fn test_parse_csv_bad_age() {
        let text = "name,email,age\nAlice,alice@example.com,thirty\n";
        assert!(matches!(parse_csv(text), Err(DbError::ParseError(_))));
    }

    #[test]
    fn test_parse_csv_missing_column() {
        let text = "name,age\nAlice,30\n";
        assert!(matches!(parse_csv(text), Err(DbError::ParseError(_))));
    }

    #[test]
    fn test_seed_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name,email,age").unwrap();
        writeln!(file, "Alice,alice@example.com,30").unwrap();
        writeln!(file, "Bob,bob@example.com,25").unwrap();
        file.flush().unwrap();

        let store = Arc::new(UserStore::new());
        let loaded = seed_from_csv(&store, file.path()).unwrap();
        assert_eq!(loaded, 2);
    }

    #[test]
    fn test_seed_from_missing_file() {
        let store = Arc::new(UserStore::new());
        assert!(matches!(
            seed_from_csv(&store, "/nonexistent/users.csv"),
            Err(DbError::IoError(_))
        ));
    }
}
