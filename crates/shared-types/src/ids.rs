//! # Identity Generation
//!
//! Fresh identities are random v4 UUIDs. A collision against an existing key
//! is retried internally; it is the only operation the core ever retries.

use tracing::warn;
use uuid::Uuid;

/// Default number of generation attempts before giving up.
pub const DEFAULT_ID_ATTEMPTS: u32 = 8;

/// Generate an identity not rejected by `is_taken`.
///
/// Returns `None` once `attempts` candidates have all collided.
pub fn generate_unique_id<F>(attempts: u32, is_taken: F) -> Option<Uuid>
where
    F: Fn(&Uuid) -> bool,
{
    generate_with(attempts, Uuid::new_v4, is_taken)
}

fn generate_with<G, F>(attempts: u32, mut next: G, is_taken: F) -> Option<Uuid>
where
    G: FnMut() -> Uuid,
    F: Fn(&Uuid) -> bool,
{
    for attempt in 1..=attempts {
        let candidate = next();
        if !is_taken(&candidate) {
            return Some(candidate);
        }
        warn!(attempt, id = %candidate, "identity collision, retrying");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_id_first_try() {
        let id = generate_unique_id(DEFAULT_ID_ATTEMPTS, |_| false);
        assert!(id.is_some());
    }

    #[test]
    fn test_generate_retries_on_collision() {
        let taken = Uuid::from_u128(1);
        let mut seq = vec![Uuid::from_u128(2), taken, taken].into_iter().rev();
        let id = generate_with(3, || seq.next().unwrap_or_default(), |c| *c == taken);
        assert_eq!(id, Some(Uuid::from_u128(2)));
    }

    #[test]
    fn test_generate_gives_up() {
        let id = generate_unique_id(3, |_| true);
        assert!(id.is_none());
    }
}
