//! # リポジトリ実装
//!
//! ドメインエンティティの永続化を担当するリポジトリを提供する。
//!
//! ## 設計方針
//!
//! - **依存性逆転**: トレイトをインフラ層で定義し、ユースケース層はトレイト経由で利用
//! - **データベース抽象化**: sqlx を使用し、PostgreSQL 固有の処理をカプセル化
//! - **テスタビリティ**: トレイト経由でスタブ可能な設計

pub mod role_repository;
pub mod todo_repository;
pub mod user_repository;

pub use role_repository::{PostgresRoleRepository, RoleRepository};
pub use todo_repository::{PostgresTodoRepository, TodoRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
