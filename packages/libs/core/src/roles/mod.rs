//! Role 정의 및 접근 가드
//!
//! - `role`: 정규 Role 열거형과 별칭 테이블
//! - `guard`: Identity와 요구 role을 비교하는 허용/거부 판정

mod guard;
mod role;

pub use guard::{has_any_role, has_role, require_any_role, require_authenticated, require_role};
pub use role::{normalize_role, Role};
