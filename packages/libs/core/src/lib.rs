//! nursery-core: Nursery 백엔드 공통 핵심 라이브러리
//!
//! 이 크레이트는 API 서비스와 SQL 빌더가 공유하는 핵심 타입과 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: Identity, 토큰 검증/발급, 비밀번호 해시
//! - `roles`: Role 별칭 정규화 및 접근 가드
//! - `policy`: 리소스 정책 파싱 및 평가
//! - `error`: 공통 에러 타입
//! - `id`: ID 생성 전략 (ULID, UUID 등)

pub mod auth;
pub mod error;
pub mod id;
pub mod policy;
pub mod roles;

pub use error::{Error, Result};
