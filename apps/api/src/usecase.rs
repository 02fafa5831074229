//! # ユースケース層
//!
//! ハンドラから呼び出されるアプリケーションロジックを定義する。
//!
//! ## 設計方針
//!
//! - **トレイトで抽象化**: ハンドラは `Arc<dyn XxxUseCase>` に依存し、
//!   テストではスタブ実装に差し替える
//! - **依存はコンストラクタ注入**: リポジトリ・ハッシュ化・時刻（Clock）を
//!   `Arc` で受け取る
//! - **値オブジェクトを受け取る**: DTO からの変換とバリデーションは
//!   ハンドラ層の責務。ユースケースは検証済みの値のみ扱う

pub mod auth;
pub mod todo;
pub mod user;

pub use auth::{AuthUseCase, AuthUseCaseImpl, AuthenticatedUser, RegisterUser};
pub use todo::{TodoUpdate, TodoUseCase, TodoUseCaseImpl};
pub use user::{CreateUser, UserUseCase, UserUseCaseImpl};
