//! API 서버 설정

use std::env;

use anyhow::Context;

/// 실행 환경
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// API 서버 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// 실행 환경 (로그 상세도, 에러 메시지 노출 여부)
    pub environment: Environment,

    /// DB 파일 경로
    pub database_path: String,

    /// 토큰 서명 시크릿
    pub jwt_secret: String,

    /// 토큰 수명 (초)
    pub token_ttl_secs: i64,

    /// 시작 시 테이블 생성 여부
    pub bootstrap_schema: bool,

    /// 리소스 정책 파일 (None = 내장 정책)
    pub policy_path: Option<String>,

    /// 초기 관리자 계정
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("database_path", &self.database_path)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("bootstrap_schema", &self.bootstrap_schema)
            .field("policy_path", &self.policy_path)
            .field("admin_email", &self.admin_email)
            .finish()
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("NURSERY_JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("NURSERY_JWT_SECRET must be set")?;

        let ttl_raw = env::var("NURSERY_JWT_EXPIRES_IN").unwrap_or_else(|_| "24h".to_string());

        Ok(Self {
            port: env::var("NURSERY_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("NURSERY_PORT must be a port number")?,

            environment: Environment::parse(
                &env::var("NURSERY_ENV").unwrap_or_else(|_| "development".to_string()),
            ),

            database_path: env::var("NURSERY_DB_PATH")
                .unwrap_or_else(|_| "data/nursery.db".to_string()),

            jwt_secret,

            token_ttl_secs: parse_lifetime(&ttl_raw)
                .with_context(|| format!("invalid NURSERY_JWT_EXPIRES_IN: {}", ttl_raw))?,

            bootstrap_schema: env::var("NURSERY_DB_BOOTSTRAP")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),

            policy_path: env::var("NURSERY_POLICY_PATH").ok(),

            admin_email: env::var("NURSERY_ADMIN_EMAIL").ok(),
            admin_password: env::var("NURSERY_ADMIN_PASSWORD").ok(),
        })
    }

    /// 테스트/개발용 설정
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            environment: Environment::Development,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
            bootstrap_schema: true,
            policy_path: None,
            admin_email: None,
            admin_password: None,
        }
    }
}

/// `30`, `45s`, `15m`, `24h`, `7d` 형식의 수명을 초로 변환
pub fn parse_lifetime(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => raw.split_at(idx),
        None => (raw, "s"),
    };

    let value: i64 = digits.parse().ok()?;
    let multiplier = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };

    let secs = value.checked_mul(multiplier)?;
    (secs > 0).then_some(secs)
}
