//! ID 생성 전략
//!
//! 리소스 정책의 `key_strategy` 옵션에 따라 PK 값을 생성합니다.
//!
//! # 지원되는 전략
//!
//! - `ulid`: 기본값. 주문·계정 키처럼 생성 순서대로 정렬되는 26자 키
//! - `uuid_v4`: 36자 랜덤 키
//! - `auto_increment`: DB가 생성 (서버는 생성하지 않음)
//! - `client`: 클라이언트가 제공 (서버는 생성하지 않음)

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// ID 생성 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// 정렬 가능한 ULID 문자열
    #[default]
    Ulid,

    /// 랜덤 UUID
    UuidV4,

    /// DB Auto Increment - 정수 키, DB가 생성
    AutoIncrement,

    /// 요청 본문의 키 값을 그대로 사용
    Client,
}

impl IdStrategy {
    /// 서버가 ID를 생성해야 하는지 여부
    pub fn server_generates(&self) -> bool {
        matches!(self, IdStrategy::Ulid | IdStrategy::UuidV4)
    }

    /// 요청 본문에 키가 반드시 있어야 하는지
    pub fn client_provides(&self) -> bool {
        matches!(self, IdStrategy::Client)
    }

    /// 정수 키인지 여부
    pub fn is_integer(&self) -> bool {
        matches!(self, IdStrategy::AutoIncrement)
    }
}

/// ID 생성기
pub struct IdGenerator;

impl IdGenerator {
    /// 새 행의 키 문자열을 만듭니다. DB나 클라이언트가 정하는 전략은 에러입니다.
    pub fn generate(strategy: IdStrategy) -> Result<String> {
        match strategy {
            IdStrategy::Ulid => Ok(ulid::Ulid::new().to_string()),

            IdStrategy::UuidV4 => Ok(uuid::Uuid::new_v4().to_string()),

            IdStrategy::AutoIncrement | IdStrategy::Client => Err(Error::UnsupportedIdStrategy {
                strategy: format!("{:?}", strategy),
            }),
        }
    }
}
