//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各リソースのハンドラはサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、DTO の検証と変換のみ行い、
//!   ビジネスロジックは usecase 層に委譲
//!
//! ## ハンドラ一覧
//!
//! - `auth`: ログイン・登録・現在ユーザー
//! - `todo`: TODO の CRUD
//! - `user`: ユーザー管理（管理者のみ）
//! - `health`: ヘルスチェック

pub mod auth;
pub mod health;
pub mod todo;
pub mod user;

pub use auth::{AuthHandlerState, login, me, register};
pub use health::{HealthState, health_check};
pub use todo::{TodoState, create_todo, delete_todo, get_todo, list_todos, update_todo};
pub use user::{UserState, create_user, delete_user, get_user, list_users, update_user_roles};
