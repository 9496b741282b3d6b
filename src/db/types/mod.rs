//! 数据库类型模块
//!
//! 拆分为三个子模块：
//! - `enums`: 枚举类型（OrderStatus）
//! - `records`: 记录类型（OrderRecord）
//! - `inputs`: 输入类型（NewOrder, OrderFilter）

mod enums;
mod inputs;
mod records;

use sqlx::{Pool, Sqlite};

/// 数据库连接池类型别名
pub type DbPool = Pool<Sqlite>;

/// 数据库迁移器
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

pub use enums::OrderStatus;
pub use inputs::{NewOrder, OrderFilter};
pub use records::OrderRecord;
