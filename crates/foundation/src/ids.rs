/// Chat session identifier: `session_{epoch_ms}_{9 base-36 chars}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(String);

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 9;

impl SessionId {
    /// Builds an id from a timestamp and a uniform random value in `[0, 1)`.
    pub fn generate(now_ms: u64, random: f64) -> Self {
        let mut frac = random.clamp(0.0, 1.0 - f64::EPSILON);
        let mut suffix = String::with_capacity(SUFFIX_LEN);
        for _ in 0..SUFFIX_LEN {
            frac *= 36.0;
            let digit = frac.floor() as usize;
            suffix.push(BASE36[digit.min(35)] as char);
            frac -= digit as f64;
        }
        SessionId(format!("session_{now_ms}_{suffix}"))
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        SessionId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::SessionId;

    #[test]
    fn generated_id_has_expected_shape() {
        let id = SessionId::generate(1_700_000_000_000, 0.123_456);
        let s = id.as_str();
        assert!(s.starts_with("session_1700000000000_"));
        let suffix = s.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn different_randoms_give_different_ids() {
        let a = SessionId::generate(1, 0.25);
        let b = SessionId::generate(1, 0.75);
        assert_ne!(a, b);
    }

    #[test]
    fn random_of_one_does_not_overflow_alphabet() {
        let id = SessionId::generate(5, 1.0);
        let suffix = id.as_str().rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 9);
        assert!(suffix.starts_with('z'));
    }
}
