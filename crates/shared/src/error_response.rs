//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ## 設計
//!
//! - `ErrorResponse` は純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は API 層の責務（shared に axum 依存を入れない）
//! - よく使うエラー種別は便利コンストラクタで提供し、ステータスコードの
//!   ハードコードを排除
//! - バリデーションエラーはフィールド単位の詳細を `validationErrors` に載せる

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// エラーレスポンス
///
/// すべてのエンドポイントで統一されたエラーレスポンス形式。
/// `error` はエラー種別の固定ラベル、`message` は人間可読な詳細、
/// `path` はエラーが発生したリクエストパスを示す。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
   pub timestamp: DateTime<Utc>,
   pub status:    u16,
   pub error:     String,
   pub message:   String,
   pub path:      String,
   /// フィールド単位のバリデーションエラー（キー: フィールド名、値: メッセージ）
   ///
   /// バリデーションエラー以外では出力されない。
   #[serde(
      rename = "validationErrors",
      skip_serializing_if = "Option::is_none",
      default
   )]
   pub validation_errors: Option<HashMap<String, String>>,
}

impl ErrorResponse {
   /// 汎用コンストラクタ
   ///
   /// `timestamp` には呼び出し時点の現在時刻が設定される。
   pub fn new(
      status: u16,
      error: impl Into<String>,
      message: impl Into<String>,
      path: impl Into<String>,
   ) -> Self {
      Self {
         timestamp: Utc::now(),
         status,
         error: error.into(),
         message: message.into(),
         path: path.into(),
         validation_errors: None,
      }
   }

   /// フィールド単位のバリデーションエラーを付加する
   pub fn with_validation_errors(mut self, errors: HashMap<String, String>) -> Self {
      self.validation_errors = Some(errors);
      self
   }

   /// 400 Bad Request
   pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(400, "Bad Request", message, path)
   }

   /// 400 Validation Error
   pub fn validation_error(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(400, "Validation Error", message, path)
   }

   /// 401 Unauthorized
   pub fn unauthorized(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(401, "Unauthorized", message, path)
   }

   /// 403 Forbidden
   pub fn forbidden(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(403, "Forbidden", message, path)
   }

   /// 404 Not Found
   pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(404, "Not Found", message, path)
   }

   /// 409 Conflict
   pub fn conflict(message: impl Into<String>, path: impl Into<String>) -> Self {
      Self::new(409, "Conflict", message, path)
   }

   /// 500 Internal Server Error
   ///
   /// message は固定値（内部情報を漏らさないため）。
   pub fn internal_error(path: impl Into<String>) -> Self {
      Self::new(
         500,
         "Internal Server Error",
         "内部エラーが発生しました",
         path,
      )
   }
}
