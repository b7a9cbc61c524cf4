//! Helpers for onboarding a new team.

use rand::{distr::Alphanumeric, Rng};

/// Address of the support account created for every team.
pub fn generate_super_user_email(team_name: &str) -> String {
    let slug: String = team_name
        .chars()
        .take(30)
        .collect::<String>()
        .to_lowercase()
        .replace(' ', "");
    format!("superuser@{slug}.com")
}

/// Throwaway password for the first client user; they reset it on first access.
pub fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_passwords_differ() {
        let a = random_password();
        let b = random_password();
        assert_eq!(a.len(), 24);
        assert_ne!(a, b);
    }
}
