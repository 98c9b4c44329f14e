use rand::RngCore;
use rand_core::OsRng;

/// Generates a fixed-size array of cryptographically secure random bytes.
pub fn random_bytes_fixed<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    OsRng.fill_bytes(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_bytes_fixed_not_all_zero() {
        let buf: [u8; 32] = random_bytes_fixed();
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn random_bytes_fixed_differ_between_calls() {
        let a: [u8; 32] = random_bytes_fixed();
        let b: [u8; 32] = random_bytes_fixed();
        assert_ne!(a, b);
    }
}
