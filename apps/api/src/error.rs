//! # API エラー定義
//!
//! ハンドラ・ユースケースで発生するエラーと、HTTP レスポンスへの変換を定義する。
//!
//! ## レスポンスボディへのパス付与
//!
//! エラーレスポンス（[`todolist_shared::ErrorResponse`]）はリクエストパスを
//! 含むが、axum の `IntoResponse` はリクエスト情報にアクセスできない。
//! そこで `IntoResponse` はステータスとボディ素材（[`ErrorBody`]）を
//! レスポンス拡張に格納するだけにし、ルーター最上段の
//! [`render_error_body`] ミドルウェアがパスを補完して JSON ボディを確定する。
//!
//! ## エラー種別と HTTP ステータスの対応
//!
//! | エラー | ステータス |
//! |--------|-----------|
//! | バリデーション失敗 | 400 Bad Request |
//! | 認証失敗（資格情報・トークン） | 401 Unauthorized |
//! | 権限不足 | 403 Forbidden |
//! | エンティティ未発見 | 404 Not Found |
//! | ユーザー名・メール重複 | 409 Conflict |
//! | インフラ障害 | 500 Internal Server Error |

use std::collections::HashMap;

use axum::{
   Json,
   body::Body,
   extract::Request,
   http::StatusCode,
   middleware::Next,
   response::{IntoResponse, Response},
};
use thiserror::Error;
use todolist_domain::DomainError;
use todolist_infra::InfraError;
use todolist_shared::ErrorResponse;

/// API 層で発生するエラー
#[derive(Debug, Error)]
pub enum ApiError {
   /// ドメインエラー（バリデーション・未発見・競合）
   #[error(transparent)]
   Domain(#[from] DomainError),

   /// フィールド単位のバリデーションエラー
   #[error("入力値が不正です")]
   Validation {
      /// フィールド名 → エラーメッセージ
      fields: HashMap<String, String>,
   },

   /// 認証失敗（資格情報の不一致・無効なユーザー）
   ///
   /// ユーザーの存在有無を推測されないよう、原因によらず同一メッセージで返す。
   #[error("認証に失敗しました")]
   AuthenticationFailed,

   /// インフラエラー
   #[error(transparent)]
   Infra(#[from] InfraError),

   /// 内部エラー
   #[error("内部エラー: {0}")]
   Internal(String),
}

impl ApiError {
   /// 単一フィールドのバリデーションエラーを生成する
   pub fn validation_field(field: impl Into<String>, error: DomainError) -> Self {
      Self::Validation {
         fields: HashMap::from([(field.into(), error.to_string())]),
      }
   }
}

/// エラーレスポンスの素材
///
/// `IntoResponse` 時点ではリクエストパスが不明なため、
/// パス以外の情報をレスポンス拡張に載せて [`render_error_body`] に引き渡す。
#[derive(Debug, Clone)]
pub struct ErrorBody {
   pub status:            StatusCode,
   pub error:             &'static str,
   pub message:           String,
   pub validation_errors: Option<HashMap<String, String>>,
}

impl ErrorBody {
   fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
      Self {
         status,
         error,
         message: message.into(),
         validation_errors: None,
      }
   }
}

impl IntoResponse for ApiError {
   fn into_response(self) -> Response {
      let body = match self {
         ApiError::Domain(DomainError::Validation(msg)) => {
            ErrorBody::new(StatusCode::BAD_REQUEST, "Validation Error", msg)
         }
         ApiError::Domain(err @ DomainError::NotFound { .. }) => {
            ErrorBody::new(StatusCode::NOT_FOUND, "Not Found", err.to_string())
         }
         ApiError::Domain(DomainError::Conflict(msg)) => {
            ErrorBody::new(StatusCode::CONFLICT, "Conflict", msg)
         }
         ApiError::Validation { fields } => ErrorBody {
            status:            StatusCode::BAD_REQUEST,
            error:             "Validation Error",
            message:           "入力値が不正です".to_string(),
            validation_errors: Some(fields),
         },
         ApiError::AuthenticationFailed => ErrorBody::new(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            "ユーザー名またはパスワードが正しくありません",
         ),
         ApiError::Infra(e) => {
            tracing::error!(error = %e, span_trace = %e.span_trace(), "インフラエラー");
            ErrorBody::new(
               StatusCode::INTERNAL_SERVER_ERROR,
               "Internal Server Error",
               "内部エラーが発生しました",
            )
         }
         ApiError::Internal(msg) => {
            tracing::error!("内部エラー: {}", msg);
            ErrorBody::new(
               StatusCode::INTERNAL_SERVER_ERROR,
               "Internal Server Error",
               "内部エラーが発生しました",
            )
         }
      };

      let mut response = Response::new(Body::empty());
      *response.status_mut() = body.status;
      response.extensions_mut().insert(body);
      response
   }
}

/// レスポンス拡張の [`ErrorBody`] を JSON ボディに確定するミドルウェア
///
/// ルーター最上段（すべてのルート・ミドルウェアの外側）に配置し、
/// リクエストパスを補完した [`ErrorResponse`] を構築する。
pub async fn render_error_body(req: Request, next: Next) -> Response {
   let path = req.uri().path().to_owned();
   let mut response = next.run(req).await;

   let Some(body) = response.extensions_mut().remove::<ErrorBody>() else {
      return response;
   };

   let mut error_response = ErrorResponse::new(
      body.status.as_u16(),
      body.error,
      body.message,
      path,
   );
   if let Some(fields) = body.validation_errors {
      error_response = error_response.with_validation_errors(fields);
   }

   (body.status, Json(error_response)).into_response()
}

#[cfg(test)]
mod tests {
   use axum::{Router, routing::get};
   use pretty_assertions::assert_eq;
   use tower::ServiceExt as _;

   use super::*;

   async fn call(app: Router, path: &str) -> (StatusCode, serde_json::Value) {
      let response = app
         .oneshot(
            Request::builder()
               .uri(path)
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      let status = response.status();
      let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      let json = serde_json::from_slice(&bytes).unwrap();
      (status, json)
   }

   fn app_returning(error: fn() -> ApiError) -> Router {
      Router::new()
         .route(
            "/api/todos",
            get(move || async move { Err::<(), ApiError>(error()) }),
         )
         .layer(axum::middleware::from_fn(render_error_body))
   }

   #[tokio::test]
   async fn test_not_foundエラーが404とパス付きボディになる() {
      let app = app_returning(|| {
         ApiError::Domain(DomainError::NotFound {
            entity_type: "Todo",
            id:          "abc".to_string(),
         })
      });

      let (status, json) = call(app, "/api/todos").await;

      assert_eq!(status, StatusCode::NOT_FOUND);
      assert_eq!(json["status"], 404);
      assert_eq!(json["error"], "Not Found");
      assert_eq!(json["path"], "/api/todos");
   }

   #[tokio::test]
   async fn test_conflictエラーが409になる() {
      let app = app_returning(|| {
         ApiError::Domain(DomainError::Conflict(
            "このユーザー名は既に使用されています".to_string(),
         ))
      });

      let (status, json) = call(app, "/api/todos").await;

      assert_eq!(status, StatusCode::CONFLICT);
      assert_eq!(json["error"], "Conflict");
      assert_eq!(json["message"], "このユーザー名は既に使用されています");
   }

   #[tokio::test]
   async fn test_バリデーションエラーがフィールド詳細付きの400になる() {
      let app = app_returning(|| {
         ApiError::validation_field(
            "title",
            DomainError::Validation("タイトルは必須です".to_string()),
         )
      });

      let (status, json) = call(app, "/api/todos").await;

      assert_eq!(status, StatusCode::BAD_REQUEST);
      assert_eq!(json["error"], "Validation Error");
      assert_eq!(
         json["validationErrors"]["title"],
         "バリデーションエラー: タイトルは必須です"
      );
   }

   #[tokio::test]
   async fn test_認証失敗が401になる() {
      let app = app_returning(|| ApiError::AuthenticationFailed);

      let (status, json) = call(app, "/api/todos").await;

      assert_eq!(status, StatusCode::UNAUTHORIZED);
      assert_eq!(json["error"], "Unauthorized");
   }

   #[tokio::test]
   async fn test_内部エラーは詳細を漏らさない() {
      let app = app_returning(|| ApiError::Internal("接続文字列が不正".to_string()));

      let (status, json) = call(app, "/api/todos").await;

      assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
      assert_eq!(json["message"], "内部エラーが発生しました");
   }
}
