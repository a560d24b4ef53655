//! 비밀번호 해시
//!
//! 계정별 salt와 함께 SHA-256 해시(hex)로 저장합니다.

use sha2::{Digest, Sha256};

/// 새 salt 생성 (32 hex chars)
pub fn generate_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// salt + 비밀번호 해시
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// 저장된 해시와 비교
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let actual = hash_password(password, salt);
    if actual.len() != expected_hash.len() {
        return false;
    }

    actual
        .bytes()
        .zip(expected_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
