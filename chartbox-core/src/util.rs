use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

pub fn random_string(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| rng.sample(Alphanumeric) as char)
        .take(length)
        .collect()
}

/// Creates a timestamp-derived record id: the millisecond timestamp with a
/// random suffix to keep ids created in the same millisecond apart.
pub fn timestamp_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), random_string(6))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_random_string_length_and_charset() {
        let value = random_string(32);

        assert_eq!(value.len(), 32);
        assert!(value.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_timestamp_ids_are_unique() {
        let first = timestamp_id();
        let second = timestamp_id();

        assert_ne!(first, second);
        assert!(first.split_once('-').is_some());
    }
}
