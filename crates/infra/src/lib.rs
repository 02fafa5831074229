//! # Todolist インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 設計方針
//!
//! このクレートはドメインモデルの永続化と、認証に必要な技術的関心事
//! （パスワードハッシュ、署名付きトークン）の具体実装を提供する。
//! 外部システムの詳細をカプセル化し、ドメイン層をインフラの変更から保護する。
//!
//! ## 責務
//!
//! - **データベース接続**: PostgreSQL への接続プール管理とマイグレーション
//! - **リポジトリ実装**: Todo / User / Role の永続化
//! - **パスワード**: Argon2id によるハッシュ化と検証
//! - **JWT**: `jsonwebtoken` によるトークンの発行と検証
//!
//! ## 依存関係
//!
//! ```text
//! api → infra → domain
//! ```
//!
//! インフラ層は `domain` に依存する。
//! ドメイン層はインフラ層に依存しない（依存性逆転の原則）。
//!
//! ## モジュール構成
//!
//! - [`db`] - PostgreSQL データベース接続管理
//! - [`error`] - インフラ層エラー定義
//! - [`jwt`] - JWT の発行・検証
//! - [`password`] - パスワードのハッシュ化・検証
//! - [`repository`] - リポジトリ実装

pub mod db;
pub mod error;
pub mod jwt;
pub mod password;
pub mod repository;

pub use error::InfraError;
pub use jwt::{Claims, JwtService};
pub use password::{
   Argon2PasswordChecker,
   Argon2PasswordHasher,
   PasswordChecker,
   PasswordHasher,
};
