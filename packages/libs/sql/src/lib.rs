//! nursery-sql: 문장 빌더 라이브러리
//!
//! 테이블 이름과 컬럼 → 값 목록으로 SQL 문장을 만듭니다.
//! 모든 값은 바인딩 파라미터로 전달되고, 텍스트 형태에는 `escape`를 거쳐서만 들어갑니다.
//!
//! # 모듈 구조
//!
//! - `value`: SQL 값과 리터럴 이스케이프
//! - `statement`: INSERT/UPDATE/DELETE/SELECT 빌더
//! - `params`: 목록 조회 파라미터 파싱/검증
//! - `select`: 연산자·정렬·페이지네이션 목록 SELECT (SeaQuery)

pub mod params;
pub mod select;
pub mod statement;
pub mod value;

pub use params::{ListParams, SortOrder, WhereClause};
pub use select::SelectBuilder;
pub use statement::{
    build_delete, build_delete_all, build_insert, build_select, build_update, build_update_all,
    build_where_clause, quote_ident, ColumnValues, Predicate, Statement, StatementKind,
    WhereFragment,
};
pub use value::{escape, SqlValue};
