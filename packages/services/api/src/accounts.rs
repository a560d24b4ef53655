//! 계정 저장소 (`Users` 테이블)

use serde_json::{json, Map, Value};

use nursery_core::auth::{generate_salt, hash_password, verify_password, Identity};
use nursery_core::id::{IdGenerator, IdStrategy};
use nursery_sql::{build_insert, build_select, ColumnValues, Predicate, SqlValue};

use crate::error::{ApiError, Result};
use crate::gateway::Gateway;

const TABLE: &str = "Users";

const COLUMNS: &[&str] = &[
    "ID",
    "Email",
    "FullName",
    "PasswordHash",
    "PasswordSalt",
    "Roles",
    "IsActive",
];

/// 저장된 계정
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub roles: Vec<String>,
    pub is_active: bool,
    password_hash: Option<String>,
    password_salt: Option<String>,
}

/// 새 계정 입력
#[derive(Debug, Clone)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub full_name: Option<&'a str>,
    pub roles: Vec<String>,
}

impl Account {
    fn from_row(row: &Map<String, Value>) -> Option<Self> {
        let text = |col: &str| row.get(col).and_then(Value::as_str).map(str::to_string);

        Some(Self {
            id: text("ID")?,
            email: text("Email")?,
            full_name: text("FullName"),
            roles: split_roles(&text("Roles").unwrap_or_default()),
            is_active: match row.get("IsActive") {
                Some(Value::Bool(b)) => *b,
                Some(Value::Number(n)) => n.as_i64() != Some(0),
                _ => true,
            },
            password_hash: text("PasswordHash"),
            password_salt: text("PasswordSalt"),
        })
    }

    /// 비밀번호 확인 (비밀번호가 없는 계정은 항상 실패)
    pub fn check_password(&self, password: &str) -> bool {
        match (&self.password_salt, &self.password_hash) {
            (Some(salt), Some(hash)) => verify_password(password, salt, hash),
            _ => false,
        }
    }

    pub fn identity(&self) -> Result<Identity> {
        Ok(Identity::new(&self.id, &self.email, self.roles.clone())?)
    }

    /// 응답용 프로필 (비밀번호 필드 제외)
    pub fn profile(&self) -> Value {
        json!({
            "id": self.id,
            "email": self.email,
            "fullName": self.full_name,
            "roles": self.roles,
        })
    }
}

/// 이메일 정규화 (앞뒤 공백 제거, 소문자)
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn split_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn find_by_email(gateway: &Gateway, email: &str) -> Result<Option<Account>> {
    let stmt = build_select(
        TABLE,
        COLUMNS,
        &Predicate::new().set("Email", normalize_email(email)),
    )?;
    let rows = gateway.query(&stmt).await?;
    Ok(rows.first().and_then(Account::from_row))
}

pub async fn count(gateway: &Gateway) -> Result<i64> {
    let rows = gateway.query_sql("SELECT COUNT(*) AS total FROM [Users]").await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("total"))
        .and_then(Value::as_i64)
        .unwrap_or(0))
}

/// 계정 생성
pub async fn create(gateway: &Gateway, new: NewAccount<'_>) -> Result<Account> {
    let email = normalize_email(new.email);
    if find_by_email(gateway, &email).await?.is_some() {
        return Err(ApiError::Conflict {
            message: format!("account {} already exists", email),
        });
    }

    let id = IdGenerator::generate(IdStrategy::Ulid)?;
    let salt = generate_salt();
    let values = ColumnValues::new()
        .set("ID", id.as_str())
        .set("Email", email.as_str())
        .set("FullName", new.full_name)
        .set("PasswordHash", hash_password(new.password, &salt))
        .set("PasswordSalt", salt.as_str())
        .set("Roles", new.roles.join(","))
        .set("IsActive", true)
        .set("CreatedAt", SqlValue::Date(chrono::Utc::now().naive_utc()));

    gateway.execute(&build_insert(TABLE, &values)?).await?;
    tracing::info!(account = %id, roles = ?new.roles, "Account created");

    let stmt = build_select(TABLE, COLUMNS, &Predicate::new().set("ID", id.as_str()))?;
    let rows = gateway.query(&stmt).await?;
    rows.first()
        .and_then(Account::from_row)
        .ok_or_else(|| ApiError::Internal {
            message: format!("account {} not readable after insert", id),
        })
}
