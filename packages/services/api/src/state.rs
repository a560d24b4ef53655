//! API 앱 상태

use anyhow::Context;

use nursery_core::auth::{TokenIssuer, TokenVerifier};
use nursery_core::policy::ResourcePolicy;
use nursery_core::roles::Role;
use nursery_sql::quote_ident;

use crate::accounts::{self, NewAccount};
use crate::config::Config;
use crate::gateway::Gateway;
use crate::schema;

/// 내장 리소스 정책
const BUNDLED_POLICY: &str = include_str!("../policy.yaml");

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다.
pub struct AppState {
    /// 설정
    pub config: Config,

    /// 단일 연결 DB Gateway
    pub gateway: Gateway,

    /// 리소스 정책
    pub policy: ResourcePolicy,

    pub verifier: TokenVerifier,
    pub issuer: TokenIssuer,
}

impl AppState {
    /// 새 상태 생성
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let gateway = Gateway::open(&config.database_path, !config.environment.is_production())?;
        Self::with_gateway(config, gateway).await
    }

    /// 주어진 Gateway로 상태 생성 (스키마 준비 + 관리자 계정 시드)
    pub async fn with_gateway(config: &Config, gateway: Gateway) -> anyhow::Result<Self> {
        let policy = load_policy(config)?;

        if config.bootstrap_schema {
            schema::bootstrap(&gateway).await?;
        }

        if let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) {
            seed_manager(&gateway, email, password).await?;
        }

        let ttl = chrono::Duration::seconds(config.token_ttl_secs);

        Ok(Self {
            config: config.clone(),
            gateway,
            policy,
            verifier: TokenVerifier::new(&config.jwt_secret),
            issuer: TokenIssuer::new(&config.jwt_secret, ttl),
        })
    }
}

/// 정책 로드 (파일 우선, 없으면 내장 정책)
fn load_policy(config: &Config) -> anyhow::Result<ResourcePolicy> {
    let yaml = match &config.policy_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read policy file {}", path))?,
        None => BUNDLED_POLICY.to_string(),
    };

    let policy = ResourcePolicy::from_yaml(&yaml)?;

    // 테이블/컬럼 이름은 문장에 식별자로 들어가므로 미리 검증
    for (name, def) in &policy.resources {
        for ident in std::iter::once(&def.table).chain(def.columns.iter()) {
            quote_ident(ident).with_context(|| format!("resource '{}'", name))?;
        }
    }

    tracing::info!(resources = policy.resources.len(), "Resource policy loaded");
    Ok(policy)
}

/// Users 테이블이 비어 있으면 관리자 계정 생성
async fn seed_manager(gateway: &Gateway, email: &str, password: &str) -> anyhow::Result<()> {
    if accounts::count(gateway).await? > 0 {
        return Ok(());
    }

    accounts::create(
        gateway,
        NewAccount {
            email,
            password,
            full_name: Some("Administrator"),
            roles: vec![Role::Manager.as_str().to_string()],
        },
    )
    .await?;

    tracing::info!(email = %email, "Seeded manager account");
    Ok(())
}
