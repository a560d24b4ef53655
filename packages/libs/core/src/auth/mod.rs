//! 인증 관련 타입 및 로직
//!
//! # 개요
//!
//! 모든 요청은 `Authorization: Bearer <token>` 헤더로 인증합니다.
//! 토큰이 없으면 익명 요청이며, 토큰이 있는데 검증에 실패하면 요청은 그 자리에서 끝납니다.
//!
//! # 구성
//!
//! - `identity`: 검증 후 확정되는 [`Identity`]
//! - `claims`: 현재/이전 토큰 형식과 Identity 마이그레이션
//! - `token`: 검증기(`TokenVerifier`)와 발급기(`TokenIssuer`)
//! - `password`: 계정 비밀번호 해시

mod claims;
mod identity;
mod password;
mod token;

pub use claims::{AccessTokenClaims, ClaimsShape};
pub use identity::Identity;
pub use password::{generate_salt, hash_password, verify_password};
pub use token::{bearer_token, IssuedToken, TokenIssuer, TokenVerifier};
