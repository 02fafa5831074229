//! # 認証・認可ミドルウェア
//!
//! JWT の検証（認証）と管理者ロールの確認（認可）を行う。
//!
//! ## 設計方針
//!
//! - **許可リスト方式**: 公開エンドポイント（[`PUBLIC_PATHS`]）を明示し、
//!   それ以外の `/api` 配下はすべてトークン必須とする
//! - **ステートレス検証**: トークンの署名と有効期限のみで判定し、
//!   データベースへの問い合わせは行わない
//! - **クレームの伝搬**: 検証済みクレームをリクエスト拡張に格納し、
//!   ハンドラが現在のユーザー情報として参照する
//!
//! 認証ミドルウェアはリクエストを保持しているため、エラーレスポンスは
//! [`crate::error::render_error_body`] を経由せず直接パス付きで構築する。

use std::sync::Arc;

use axum::{
   Json,
   extract::{Request, State},
   http::{StatusCode, header},
   middleware::Next,
   response::{IntoResponse, Response},
};
use todolist_domain::role::ADMIN_ROLE_NAME;
use todolist_infra::{Claims, JwtService, jwt};
use todolist_shared::ErrorResponse;

/// 認証なしでアクセスできるパス
pub const PUBLIC_PATHS: [&str; 3] = ["/api/auth/login", "/api/auth/register", "/api/health"];

/// 認証ミドルウェアの状態
#[derive(Clone)]
pub struct AuthState {
   pub jwt: Arc<JwtService>,
}

/// JWT を検証し、クレームをリクエスト拡張に格納するミドルウェア
///
/// [`PUBLIC_PATHS`] はトークンなしで通過させる。
/// それ以外は `Authorization: Bearer <token>` の検証に成功した場合のみ
/// 後続へ進み、失敗時は 401 を返す。
pub async fn authenticate(
   State(state): State<AuthState>,
   mut req: Request,
   next: Next,
) -> Response {
   let path = req.uri().path().to_owned();

   if PUBLIC_PATHS.contains(&path.as_str()) {
      return next.run(req).await;
   }

   let token = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "));

   let Some(token) = token else {
      return unauthorized("認証トークンがありません", &path);
   };

   match state.jwt.verify(token) {
      Ok(claims) => {
         tracing::debug!(username = %claims.sub, "認証成功");
         req.extensions_mut().insert(claims);
         next.run(req).await
      }
      Err(e) => {
         let message = if jwt::is_expired(&e) {
            "認証トークンの有効期限が切れています"
         } else {
            "認証トークンが無効です"
         };
         tracing::debug!(error = %e, "トークン検証失敗");
         unauthorized(message, &path)
      }
   }
}

/// 管理者ロール（`ROLE_ADMIN`）を要求するミドルウェア
///
/// [`authenticate`] の内側に配置する前提。クレームが拡張に存在しない場合は
/// 401（認証ミドルウェアを経由していない構成ミス）、ロール不足は 403 を返す。
pub async fn require_admin(req: Request, next: Next) -> Response {
   let path = req.uri().path().to_owned();

   match req.extensions().get::<Claims>() {
      Some(claims) if claims.has_role(ADMIN_ROLE_NAME) => next.run(req).await,
      Some(claims) => {
         tracing::debug!(username = %claims.sub, "管理者権限なし");
         forbidden("この操作には管理者権限が必要です", &path)
      }
      None => unauthorized("認証トークンがありません", &path),
   }
}

fn unauthorized(message: &str, path: &str) -> Response {
   (
      StatusCode::UNAUTHORIZED,
      Json(ErrorResponse::unauthorized(message, path)),
   )
      .into_response()
}

fn forbidden(message: &str, path: &str) -> Response {
   (
      StatusCode::FORBIDDEN,
      Json(ErrorResponse::forbidden(message, path)),
   )
      .into_response()
}
