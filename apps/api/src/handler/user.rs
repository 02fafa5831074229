//! # ユーザー管理ハンドラ
//!
//! 管理者向けのユーザー管理エンドポイントを提供する。
//! ルーター側で `ROLE_ADMIN` を要求するミドルウェアを適用する前提。
//!
//! ## エンドポイント
//!
//! - `GET /api/users` - 一覧取得
//! - `GET /api/users/{id}` - 単一取得
//! - `POST /api/users` - 作成（201）
//! - `PUT /api/users/{id}/roles` - ロール割り当ての差し替え
//! - `DELETE /api/users/{id}` - 削除（204）

use std::sync::Arc;

use axum::{
   Json,
   extract::{Path, State},
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use todolist_domain::{
   password::PlainPassword,
   role::{Role, RoleName},
   user::{Email, User, UserId, Username},
};
use todolist_shared::ApiResponse;
use uuid::Uuid;

use crate::{
   error::ApiError,
   usecase::{CreateUser, UserUseCase},
};

/// ユーザー管理ハンドラの共有状態
pub struct UserState {
   pub usecase: Arc<dyn UserUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// ユーザー作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
   pub username: String,
   pub email:    String,
   pub password: String,
   /// 割り当てるロール名。省略時は既定ロール（`ROLE_USER`）
   #[serde(default)]
   pub roles:    Vec<String>,
}

/// ロール割り当て更新リクエスト
#[derive(Debug, Deserialize)]
pub struct UpdateUserRolesRequest {
   pub roles: Vec<String>,
}

/// ユーザーレスポンス
///
/// `/api/users` と `/api/auth/me` で共通のレスポンス形式。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
   pub id:         Uuid,
   pub username:   String,
   pub email:      String,
   pub roles:      Vec<String>,
   pub enabled:    bool,
   pub created_at: DateTime<Utc>,
}

impl UserResponse {
   pub fn from_user(user: User, roles: Vec<Role>) -> Self {
      Self {
         id:         *user.id().as_uuid(),
         username:   user.username().as_str().to_string(),
         email:      user.email().as_str().to_string(),
         roles:      roles
            .into_iter()
            .map(|r| r.name().as_str().to_string())
            .collect(),
         enabled:    user.is_enabled(),
         created_at: user.created_at(),
      }
   }
}

/// リクエストの共通フィールドを検証済みの値オブジェクトに変換する
pub(crate) fn parse_user_fields(
   username: String,
   email: String,
   password: String,
) -> Result<(Username, Email, PlainPassword), ApiError> {
   let username =
      Username::new(username).map_err(|e| ApiError::validation_field("username", e))?;
   let email = Email::new(email).map_err(|e| ApiError::validation_field("email", e))?;
   if password.len() < 6 {
      return Err(ApiError::validation_field(
         "password",
         todolist_domain::DomainError::Validation(
            "パスワードは6文字以上である必要があります".to_string(),
         ),
      ));
   }

   Ok((username, email, PlainPassword::new(password)))
}

/// ロール名の一覧を値オブジェクトに変換する
pub(crate) fn parse_role_names(roles: Vec<String>) -> Result<Vec<RoleName>, ApiError> {
   roles
      .into_iter()
      .map(|name| RoleName::new(name).map_err(|e| ApiError::validation_field("roles", e)))
      .collect()
}

// --- ハンドラ ---

/// GET /api/users
pub async fn list_users(
   State(state): State<Arc<UserState>>,
) -> Result<impl IntoResponse, ApiError> {
   let users = state.usecase.list().await?;
   let response: Vec<UserResponse> = users
      .into_iter()
      .map(|(user, roles)| UserResponse::from_user(user, roles))
      .collect();

   Ok(Json(ApiResponse::new(response)))
}

/// GET /api/users/{id}
pub async fn get_user(
   State(state): State<Arc<UserState>>,
   Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
   let (user, roles) = state.usecase.get(UserId::from_uuid(id)).await?;

   Ok(Json(ApiResponse::new(UserResponse::from_user(user, roles))))
}

/// POST /api/users
pub async fn create_user(
   State(state): State<Arc<UserState>>,
   Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let (username, email, password) = parse_user_fields(req.username, req.email, req.password)?;
   let roles = parse_role_names(req.roles)?;

   let (user, roles) = state
      .usecase
      .create(CreateUser {
         username,
         email,
         password,
         roles,
      })
      .await?;

   Ok((
      StatusCode::CREATED,
      Json(ApiResponse::new(UserResponse::from_user(user, roles))),
   ))
}

/// PUT /api/users/{id}/roles
pub async fn update_user_roles(
   State(state): State<Arc<UserState>>,
   Path(id): Path<Uuid>,
   Json(req): Json<UpdateUserRolesRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let role_names = parse_role_names(req.roles)?;

   let (user, roles) = state
      .usecase
      .update_roles(UserId::from_uuid(id), role_names)
      .await?;

   Ok(Json(ApiResponse::new(UserResponse::from_user(user, roles))))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
   State(state): State<Arc<UserState>>,
   Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
   state.usecase.delete(UserId::from_uuid(id)).await?;

   Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
   use std::sync::Mutex;

   use async_trait::async_trait;
   use axum::{
      Router,
      body::Body,
      http::{Method, Request},
      routing::{get, put},
   };
   use pretty_assertions::assert_eq;
   use todolist_domain::{
      DomainError,
      password::PasswordHash,
      role::{DEFAULT_ROLE_NAME, RoleId},
   };
   use tower::ServiceExt as _;

   use super::*;

   /// テスト用スタブユースケース
   #[derive(Default)]
   struct StubUserUseCase {
      users: Mutex<Vec<(User, Vec<Role>)>>,
   }

   impl StubUserUseCase {
      fn with(users: Vec<(User, Vec<Role>)>) -> Arc<Self> {
         Arc::new(Self {
            users: Mutex::new(users),
         })
      }
   }

   fn user_not_found(id: &UserId) -> ApiError {
      DomainError::NotFound {
         entity_type: "User",
         id:          id.to_string(),
      }
      .into()
   }

   #[async_trait]
   impl UserUseCase for StubUserUseCase {
      async fn list(&self) -> Result<Vec<(User, Vec<Role>)>, ApiError> {
         Ok(self.users.lock().unwrap().clone())
      }

      async fn get(&self, id: UserId) -> Result<(User, Vec<Role>), ApiError> {
         let users = self.users.lock().unwrap();
         users
            .iter()
            .find(|(u, _)| u.id() == &id)
            .cloned()
            .ok_or_else(|| user_not_found(&id))
      }

      async fn create(&self, input: CreateUser) -> Result<(User, Vec<Role>), ApiError> {
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
         let roles = vec![sample_role(DEFAULT_ROLE_NAME)];
         self
            .users
            .lock()
            .unwrap()
            .push((user.clone(), roles.clone()));
         Ok((user, roles))
      }

      async fn update_roles(
         &self,
         id: UserId,
         role_names: Vec<RoleName>,
      ) -> Result<(User, Vec<Role>), ApiError> {
         let users = self.users.lock().unwrap();
         let (user, _) = users
            .iter()
            .find(|(u, _)| u.id() == &id)
            .cloned()
            .ok_or_else(|| user_not_found(&id))?;

         let roles: Vec<Role> = role_names
            .iter()
            .map(|name| sample_role(name.as_str()))
            .collect();
         Ok((user, roles))
      }

      async fn delete(&self, id: UserId) -> Result<(), ApiError> {
         let mut users = self.users.lock().unwrap();
         let before = users.len();
         users.retain(|(u, _)| u.id() != &id);
         if users.len() < before {
            Ok(())
         } else {
            Err(user_not_found(&id))
         }
      }
   }

   fn fixed_time() -> DateTime<Utc> {
      DateTime::from_timestamp(1_700_000_000, 0).unwrap()
   }

   fn sample_role(name: &str) -> Role {
      Role::new(
         RoleId::new(),
         RoleName::new(name).unwrap(),
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
      (user, vec![sample_role(DEFAULT_ROLE_NAME)])
   }

   fn app(usecase: Arc<StubUserUseCase>) -> Router {
      Router::new()
         .route("/api/users", get(list_users).post(create_user))
         .route("/api/users/{id}", get(get_user).delete(delete_user))
         .route("/api/users/{id}/roles", put(update_user_roles))
         .with_state(Arc::new(UserState { usecase }))
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
   async fn test_一覧はロール名付きで返る() {
      let app = app(StubUserUseCase::with(vec![sample_user("yamada")]));

      let response = app
         .oneshot(
            Request::builder()
               .uri("/api/users")
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let json = body_json(response).await;
      assert_eq!(json["data"][0]["username"], "yamada");
      assert_eq!(json["data"][0]["roles"][0], DEFAULT_ROLE_NAME);
      assert_eq!(json["data"][0]["enabled"], true);
   }

   #[tokio::test]
   async fn test_作成は201を返す() {
      let app = app(StubUserUseCase::with(vec![]));

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/users",
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
      assert_eq!(json["data"]["username"], "yamada");
      assert!(json["data"]["createdAt"].is_string());
   }

   #[tokio::test]
   async fn test_不正なメールアドレスの作成は400を返す() {
      let app = app(StubUserUseCase::with(vec![]));

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/users",
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
   async fn test_短すぎるパスワードの作成は400を返す() {
      let app = app(StubUserUseCase::with(vec![]));

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/users",
            serde_json::json!({
               "username": "yamada",
               "email": "yamada@example.com",
               "password": "12345",
            }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::BAD_REQUEST);
      let json = body_json(response).await;
      assert!(json["validationErrors"]["password"].is_string());
   }

   #[tokio::test]
   async fn test_重複ユーザー名の作成は409を返す() {
      let app = app(StubUserUseCase::with(vec![sample_user("yamada")]));

      let response = app
         .oneshot(json_request(
            Method::POST,
            "/api/users",
            serde_json::json!({
               "username": "yamada",
               "email": "other@example.com",
               "password": "password123",
            }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::CONFLICT);
      let json = body_json(response).await;
      assert_eq!(json["error"], "Conflict");
   }

   #[tokio::test]
   async fn test_ロール更新は新しいロール一覧を返す() {
      let (user, roles) = sample_user("yamada");
      let id = *user.id().as_uuid();
      let app = app(StubUserUseCase::with(vec![(user, roles)]));

      let response = app
         .oneshot(json_request(
            Method::PUT,
            &format!("/api/users/{id}/roles"),
            serde_json::json!({ "roles": ["ROLE_ADMIN"] }),
         ))
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::OK);
      let json = body_json(response).await;
      assert_eq!(json["data"]["roles"], serde_json::json!(["ROLE_ADMIN"]));
   }

   #[tokio::test]
   async fn test_存在しないユーザーの削除は404を返す() {
      let app = app(StubUserUseCase::with(vec![]));

      let response = app
         .oneshot(
            Request::builder()
               .method(Method::DELETE)
               .uri(format!("/api/users/{}", Uuid::nil()))
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::NOT_FOUND);
   }

   #[tokio::test]
   async fn test_削除は204を返す() {
      let (user, roles) = sample_user("yamada");
      let id = *user.id().as_uuid();
      let app = app(StubUserUseCase::with(vec![(user, roles)]));

      let response = app
         .oneshot(
            Request::builder()
               .method(Method::DELETE)
               .uri(format!("/api/users/{id}"))
               .body(Body::empty())
               .unwrap(),
         )
         .await
         .unwrap();

      assert_eq!(response.status(), StatusCode::NO_CONTENT);
   }
}
