use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use subtle::ConstantTimeEq;

// 全站共用的固定盐，已有的管理员密码哈希都依赖它，不能改
const SALT: &[u8] = b"ontheway-admin-v1";
const ITERATIONS: u32 = 100_000;
const KEY_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("stored password hash is not valid hex: {0}")]
    MalformedDigest(#[from] hex::FromHexError),
}

fn derive(password: &str) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), SALT, ITERATIONS, &mut out);
    out
}

/// PBKDF2-HMAC-SHA256，输出 128 位十六进制字符
pub fn hash_password(password: &str) -> String {
    hex::encode(derive(password))
}

/// 校验密码。不匹配返回 `Ok(false)`；存储的哈希本身损坏时返回错误。
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let stored = hex::decode(hash.trim())?;
    let computed = derive(password);
    // 长度不同时 ct_eq 直接返回 false
    Ok(computed.as_slice().ct_eq(stored.as_slice()).into())
}
