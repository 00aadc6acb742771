//! `llmdesk hash-password`: print a credential entry for config.toml.

use llmdesk_security::hash_password;

pub fn run(username: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    if username.trim().is_empty() {
        return Err("username must not be empty".into());
    }
    print!("{}", credential_snippet(username.trim(), password));
    Ok(())
}

fn credential_snippet(username: &str, password: &str) -> String {
    let mut entry = toml::Table::new();
    entry.insert("name".into(), username.into());
    entry.insert("email".into(), "".into());
    entry.insert(
        "password_hash".into(),
        hash_password(username, password).into(),
    );
    // Quoted key, so dots and spaces stay part of the username.
    format!(
        "[auth.credentials.{}]\n{}",
        toml::Value::from(username),
        toml::to_string(&entry).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_loadable_toml() {
        let snippet = credential_snippet("alice", "pw");
        let value: toml::Value = toml::from_str(&snippet).unwrap();
        let hash = value["auth"]["credentials"]["alice"]["password_hash"]
            .as_str()
            .unwrap();
        assert!(llmdesk_security::verify_password("alice", "pw", hash));
    }

    #[test]
    fn odd_usernames_stay_one_key() {
        for username in ["j.doe", "mary ann", "say \"hi\""] {
            let snippet = credential_snippet(username, "pw");
            let value: toml::Value = toml::from_str(&snippet).unwrap();
            let credentials = value["auth"]["credentials"].as_table().unwrap();
            assert_eq!(credentials.len(), 1);
            assert_eq!(credentials[username]["name"].as_str(), Some(username));
        }
    }
}
