//! # 認証ハンドラ
//!
//! ログイン・ユーザー登録・現在ユーザー取得のエンドポイントを提供する。
//!
//! ## エンドポイント
//!
//! - `POST /api/auth/login` - ログイン（200）
//! - `POST /api/auth/register` - ユーザー登録（201）
//! - `GET /api/auth/me` - 現在ユーザーの取得（要認証）
//!
//! login / register は公開エンドポイント。me は認証ミドルウェアが
//! リクエスト拡張に格納したクレームを使用する。

use std::sync::Arc;

use axum::{
   Extension,
   Json,
   extract::State,
   http::StatusCode,
   response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use todolist_domain::role::Role;
use todolist_infra::Claims;
use todolist_shared::ApiResponse;

use crate::{
   error::ApiError,
   handler::user::{UserResponse, parse_role_names, parse_user_fields},
   usecase::{AuthUseCase, AuthenticatedUser, RegisterUser},
};

/// 認証ハンドラの共有状態
pub struct AuthHandlerState {
   pub usecase: Arc<dyn AuthUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
   pub username: String,
   pub password: String,
}

/// ユーザー登録リクエスト
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
   pub username: String,
   pub email:    String,
   pub password: String,
   /// 割り当てるロール名。省略時は既定ロール（`ROLE_USER`）
   #[serde(default)]
   pub roles:    Vec<String>,
}

/// 認証レスポンス（ログイン・登録共通）
#[derive(Debug, Serialize)]
pub struct AuthResponse {
   pub token:      String,
   /// トークン種別（常に `"Bearer"`）
   #[serde(rename = "type")]
   pub token_type: String,
   pub username:   String,
   pub email:      String,
   pub roles:      Vec<String>,
}

impl From<AuthenticatedUser> for AuthResponse {
   fn from(authenticated: AuthenticatedUser) -> Self {
      Self {
         token:      authenticated.token,
         token_type: "Bearer".to_string(),
         username:   authenticated.user.username().as_str().to_string(),
         email:      authenticated.user.email().as_str().to_string(),
         roles:      authenticated
            .roles
            .iter()
            .map(|r: &Role| r.name().as_str().to_string())
            .collect(),
      }
   }
}

// --- ハンドラ ---

/// POST /api/auth/login
pub async fn login(
   State(state): State<Arc<AuthHandlerState>>,
   Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let authenticated = state
      .usecase
      .login(
         &req.username,
         todolist_domain::password::PlainPassword::new(req.password),
      )
      .await?;

   Ok(Json(ApiResponse::new(AuthResponse::from(authenticated))))
}

/// POST /api/auth/register
pub async fn register(
   State(state): State<Arc<AuthHandlerState>>,
   Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let (username, email, password) = parse_user_fields(req.username, req.email, req.password)?;
   let roles = parse_role_names(req.roles)?;

   let authenticated = state
      .usecase
      .register(RegisterUser {
         username,
         email,
         password,
         roles,
      })
      .await?;

   Ok((
      StatusCode::CREATED,
      Json(ApiResponse::new(AuthResponse::from(authenticated))),
   ))
}

/// GET /api/auth/me
///
/// クレームのユーザー名でストレージを引き直すため、
/// 削除済みユーザーのトークンは 404 になる。
pub async fn me(
   State(state): State<Arc<AuthHandlerState>>,
   Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
   let (user, roles) = state.usecase.current_user(&claims).await?;

   Ok(Json(ApiResponse::new(UserResponse::from_user(user, roles))))
}

#[cfg(test)]
mod tests {
   use std::sync::Mutex;

   use async_trait::async_trait;
   use axum::{
      Router,
      body::Body,
      http::{Method, Request},
      routing::{get, post},
   };
   use chrono::{DateTime, Utc};
   use pretty_assertions::assert_eq;
   use todolist_domain::{
      DomainError,
      password::{PasswordHash, PlainPassword},
      role::{DEFAULT_ROLE_NAME, RoleId, RoleName},
      user::{Email, User, UserId, Username},
   };
   use tower::ServiceExt as _;

   use super::*;

   /// テスト用スタブユースケース
   #[derive(Default)]
   struct StubAuthUseCase {
      users: Mutex<Vec<(User, Vec<Role>)>>,
   }

   impl StubAuthUseCase {
      fn with(users: Vec<(User, Vec<Role>)>) -> Arc<Self> {
         Arc::new(Self {
            users: Mutex::new(users),
         })
      }
   }

   #[async_trait]
   impl AuthUseCase for StubAuthUseCase {
      async fn login(
         &self,
         username: &str,
         password: PlainPassword,
      ) -> Result<AuthenticatedUser, ApiError> {
         let users = self.users.lock().unwrap();
         let found = users
            .iter()
            .find(|(u, _)| u.username().as_str() == username)
            .cloned();
         drop(users);

         match found {
            Some((user, roles)) if password.as_str() == "password123" => {
               Ok(AuthenticatedUser {
                  token: "stub-token".to_string(),
                  user,
                  roles,
               })
            }
            _ => Err(ApiError::AuthenticationFailed),
         }
      }

      async fn register(&self, input: RegisterUser) -> Result<AuthenticatedUser, ApiError> {
         let users = self.users.lock().unwrap();
         if users.iter().any(|(u, _)| u.username() == &input.username) {
            return Err(
               DomainError::Conflict("このユーザー名は既に使用されています".to_string())
                  .into(),
            );
         }
         drop(users);

         let user = User::new(
            UserId::new(),
            input.username,
            input.email,
            PasswordHash::new("hashed"),
            fixed_time(),
         );
         let roles = vec![sample_role()];
         self
            .users
            .lock()
            .unwrap()
            .push((user.clone(), roles.clone()));

         Ok(AuthenticatedUser {
            token: "stub-token".to_string(),
            user,
            roles,
         })
      }

      async fn current_user(&self, claims: &Claims) -> Result<(User, Vec<Role>), ApiError> {
         let users = self.users.lock().unwrap();
         users
            .iter()
            .find(|(u, _)| u.username().as_str() == claims.sub)
            .cloned()
            .ok_or_else(|| {
               DomainError::NotFound {
                  entity_type: "User",
                  id:          claims.sub.clone(),
               }
               .into()
            })
      }
   }

   fn fixed_time() -> DateTime<Utc> {
      DateTime::from_timestamp(1_700_000_000, 0).unwrap()
   }

   fn sample_role() -> Role {
      Role::new(
         RoleId::new(),
         RoleName::new(DEFAULT_ROLE_NAME).unwrap(),
         None,
         fixed_time(),
      )
   }

   fn sample_user(username: &str) -> (User, Vec<Role>) {
      let user = User::new(
         UserId::new(),
         Username::new(username).unwrap(),
         Email::new(format!("{username}@example.com")).unwrap(),
         PasswordHash::new("hashed"),
         fixed_time(),
      );
      (user, vec![sample_role()])
   }

   fn sample_claims(username: &str) -> Claims {
      Claims {
         sub:   username.to_string(),
         email: format!("{username}@example.com"),
         roles: vec![DEFAULT_ROLE_NAME.to_string()],
         iat:   fixed_time().timestamp(),
         exp:   fixed_time().timestamp() + 3600,
      }
   }

   fn app(usecase: Arc<StubAuthUseCase>, claims: Option<Claims>) -> Router {
      let mut me_route = get(me);
      if let Some(claims) = claims {
         me_route = me_route.layer(Extension(claims));
      }

      Router::new()
         .route("/api/auth/login", post(login))
         .route("/api/auth/register", post(register))
         .route("/api/auth/me", me_route)
         .with_state(Arc::new(AuthHandlerState { usecase }))
         .layer(axum::middleware::from_fn(crate::error::render_error_body))
   }

   fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
      Request::builder()
         .method(method)
         .uri(uri)
         .header("content-type", "application/json")
         .body(Body::from(body.to_string()))
         .unwrap()
   }

   async fn body_json(response: axum::response::Response) -> serde_json::Value {
      let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
         .await
         .unwrap();
      serde_json::from_slice(&bytes).unwrap()
   }

   #[tokio::test]
   async fn test_ログイン成功でbearerトークンが返る() {
      let app = app(StubAuthUseCase::with(vec![sample_user("yamada")]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            serde_json::json!({ "username": "yamada", "password": "password123" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let json = body_json(response).await;
      assert_eq!(json["data"]["token"], "stub-token");
      assert_eq!(json["data"]["type"], "Bearer");
      assert_eq!(json["data"]["username"], "yamada");
      assert_eq!(json["data"]["roles"][0], DEFAULT_ROLE_NAME);
   }

   #[tokio::test]
   async fn test_パスワード不一致のログインは401を返す() {
      let app = app(StubAuthUseCase::with(vec![sample_user("yamada")]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            serde_json::json!({ "username": "yamada", "password": "wrong" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
      let json = body_json(response).await;
      // 失敗理由を区別しない固定メッセージ
      assert_eq!(
         json["message"],
         "ユーザー名またはパスワードが正しくありません"
      );
   }

   #[tokio::test]
   async fn test_存在しないユーザーのログインも同じ401を返す() {
      let app = app(StubAuthUseCase::with(vec![]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/login",
            serde_json::json!({ "username": "unknown", "password": "password123" }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
      let json = body_json(response).await;
      assert_eq!(
         json["message"],
         "ユーザー名またはパスワードが正しくありません"
      );
   }

   #[tokio::test]
   async fn test_登録は201とトークンを返す() {
      let app = app(StubAuthUseCase::with(vec![]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            serde_json::json!({
               "username": "yamada",
               "email": "yamada@example.com",
               "password": "password123",
            }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::CREATED);
      let json = body_json(response).await;
      assert_eq!(json["data"]["token"], "stub-token");
      assert_eq!(json["data"]["type"], "Bearer");
   }

   #[tokio::test]
   async fn test_不正なメールアドレスの登録は400を返す() {
      let app = app(StubAuthUseCase::with(vec![]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            serde_json::json!({
               "username": "yamada",
               "email": "not-an-email",
               "password": "password123",
            }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let json = body_json(response).await;
      assert!(json["validationErrors"]["email"].is_string());
   }

   #[tokio::test]
   async fn test_重複ユーザー名の登録は409を返す() {
      let app = app(StubAuthUseCase::with(vec![sample_user("yamada")]), None);

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/auth/register",
            serde_json::json!({
               "username": "yamada",
               "email": "other@example.com",
               "password": "password123",
            }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::CONFLICT);
   }

   #[tokio::test]
   async fn test_meは現在ユーザーを返す() {
      let app = app(
         StubAuthUseCase::with(vec![sample_user("yamada")]),
         Some(sample_claims("yamada")),
      );

      let response = app
         .oneshot(
            Request::builder()
               .uri("/api/auth/me")
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let json = body_json(response).await;
      assert_eq!(json["data"]["username"], "yamada");
      assert_eq!(json["data"]["email"], "yamada@example.com");
      assert_eq!(json["data"]["roles"][0], DEFAULT_ROLE_NAME);
   }

   #[tokio::test]
   async fn test_削除済みユーザーのmeは404を返す() {
      let app = app(
         StubAuthUseCase::with(vec![]),
         Some(sample_claims("ghost")),
      );

      let response = app
         .oneshot(
            Request::builder()
               .uri("/api/auth/me")
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::NOT_FOUND);
   }
}
