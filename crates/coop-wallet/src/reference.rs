//! Deposit reference codes: the string a user puts on their bank transfer
//! so an admin can match it to the deposit.

use coop_types::constants::{REFERENCE_CODE_ALPHABET, REFERENCE_CODE_ATTEMPTS};
use coop_types::{CoopError, ErrorCode, Result};
use rand::Rng;

/// Draw a random code of `length` characters that `taken` does not
/// reject.
pub fn generate_reference(length: usize, taken: impl Fn(&str) -> bool) -> Result<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..REFERENCE_CODE_ATTEMPTS {
        let code: String = (0..length)
            .map(|_| {
                let index = rng.gen_range(0..REFERENCE_CODE_ALPHABET.len());
                char::from(REFERENCE_CODE_ALPHABET[index])
            })
            .collect();
        if !taken(&code) {
            return Ok(code);
        }
    }
    Err(CoopError::internal(
        ErrorCode::IntStore,
        format!("no free reference code after {REFERENCE_CODE_ATTEMPTS} attempts"),
    ))
}
