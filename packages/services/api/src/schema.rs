//! 시작 시 테이블 생성

use crate::gateway::Gateway;

const TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS [Users] (
        [ID] TEXT PRIMARY KEY,
        [Email] TEXT NOT NULL UNIQUE,
        [FullName] TEXT,
        [PasswordHash] TEXT,
        [PasswordSalt] TEXT,
        [Roles] TEXT NOT NULL,
        [IsActive] BOOLEAN NOT NULL DEFAULT 1,
        [CreatedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Plants] (
        [ID] TEXT PRIMARY KEY,
        [Name] TEXT NOT NULL,
        [Species] TEXT,
        [Category] TEXT,
        [Price] REAL NOT NULL DEFAULT 0,
        [Description] TEXT,
        [SupplierID] TEXT,
        [CreatedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Inventory] (
        [ID] TEXT PRIMARY KEY,
        [PlantID] TEXT NOT NULL UNIQUE,
        [Quantity] INTEGER NOT NULL DEFAULT 0,
        [Location] TEXT,
        [UpdatedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Orders] (
        [ID] TEXT PRIMARY KEY,
        [CustomerID] TEXT NOT NULL,
        [Status] TEXT NOT NULL DEFAULT 'pending',
        [TotalAmount] REAL NOT NULL DEFAULT 0,
        [DeliveryAddress] TEXT,
        [DeliveryCompanyID] TEXT,
        [OrderDate] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [OrderItems] (
        [ID] INTEGER PRIMARY KEY AUTOINCREMENT,
        [OrderID] TEXT NOT NULL,
        [PlantID] TEXT NOT NULL,
        [Quantity] INTEGER NOT NULL,
        [UnitPrice] REAL NOT NULL
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Employees] (
        [ID] TEXT PRIMARY KEY,
        [UserID] TEXT,
        [Name] TEXT NOT NULL,
        [Position] TEXT,
        [Phone] TEXT,
        [Email] TEXT,
        [HireDate] DATETIME
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Customers] (
        [ID] TEXT PRIMARY KEY,
        [UserID] TEXT,
        [Name] TEXT NOT NULL,
        [Email] TEXT,
        [Phone] TEXT,
        [Address] TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Suppliers] (
        [ID] TEXT PRIMARY KEY,
        [UserID] TEXT,
        [Name] TEXT NOT NULL,
        [ContactEmail] TEXT,
        [Phone] TEXT,
        [Address] TEXT
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [HealthLogs] (
        [ID] TEXT PRIMARY KEY,
        [PlantID] TEXT NOT NULL,
        [EngineerID] TEXT,
        [Observation] TEXT NOT NULL,
        [Treatment] TEXT,
        [LoggedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Feedback] (
        [ID] TEXT PRIMARY KEY,
        [CustomerID] TEXT NOT NULL,
        [OrderID] TEXT,
        [Rating] INTEGER NOT NULL,
        [Comment] TEXT,
        [CreatedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
    r#"CREATE TABLE IF NOT EXISTS [Notifications] (
        [ID] TEXT PRIMARY KEY,
        [UserID] TEXT NOT NULL,
        [Message] TEXT NOT NULL,
        [IsRead] BOOLEAN NOT NULL DEFAULT 0,
        [CreatedAt] DATETIME DEFAULT CURRENT_TIMESTAMP
    );"#,
];

/// 테이블이 없으면 생성
pub async fn bootstrap(gateway: &Gateway) -> Result<(), sqlx::Error> {
    for ddl in TABLES {
        gateway.execute_ddl(ddl).await?;
    }
    tracing::info!(tables = TABLES.len(), "Schema bootstrap complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let gateway = Gateway::in_memory();
        bootstrap(&gateway).await.unwrap();
        bootstrap(&gateway).await.unwrap();

        let names = gateway.table_names().await.unwrap();
        for table in ["Users", "Plants", "Inventory", "Orders", "OrderItems", "Notifications"] {
            assert!(names.iter().any(|n| n == table), "{table}");
        }
    }
}
