//! Passcode generation

use rand::{rngs::OsRng, Rng};

/// Produces the 6-digit codes sent to users
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform codes over `100000..=999999` from the operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self) -> String {
        let code: u32 = OsRng.gen_range(100_000..=999_999);
        code.to_string()
    }
}

/// Check that a user-supplied code has the shape of a generated one
pub fn is_well_formed(code: &str) -> bool {
    code.len() == pv_shared::config::otp::CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
