use rand::{distributions::Alphanumeric, thread_rng, Rng};

const FORM_TOKEN_LEN: usize = 40;

/// Opaque single-use token for one rendered form instance.
pub fn new_form_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(FORM_TOKEN_LEN)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_sized() {
        let a = new_form_token();
        let b = new_form_token();
        assert_eq!(a.len(), FORM_TOKEN_LEN);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
