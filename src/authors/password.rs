use argon2::{
    password_hash::{PasswordHash, PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::{rngs::OsRng, RngCore};
use tracing::error;

// Chosen so the PHC string is exactly PASSWORD_HASH_LEN characters long.
const M_COST: u32 = 19_456;
const T_COST: u32 = 10;
const P_COST: u32 = 1;

pub const PASSWORD_HASH_LEN: usize = 97;
pub const ACTIVATION_TOKEN_LEN: usize = 32;

fn hasher() -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(M_COST, T_COST, P_COST, None).map_err(|e| {
        error!(error = %e, "argon2 params error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::new(Algorithm::Argon2i, Version::V0x13, params))
}

/// Hash a plain password with argon2i.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// True when `hash` is a well-formed PHC string produced by argon2i.
pub fn is_argon2i(hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| parsed.algorithm.as_str() == "argon2i")
        .unwrap_or(false)
}

/// Random 32-character lowercase hex token.
pub fn generate_activation_token() -> String {
    let mut bytes = [0u8; ACTIVATION_TOKEN_LEN / 2];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
