//! 리소스 정책 파싱 및 평가
//!
//! # 개요
//!
//! `policy.yaml`을 파싱하여 REST 리소스별 노출 컬럼과 작업별 role 규칙을 평가합니다.
//!
//! # 모듈 구조
//!
//! - `resource`: 정책 정의
//! - `evaluator`: 접근 평가기

mod evaluator;
mod resource;

pub use evaluator::{PolicyEvaluator, RowScope};
pub use resource::{
    AccessRule, Operation, OperationRules, ResourceDef, ResourcePolicy, RoleRequirement,
};
