//! # TODO ハンドラ
//!
//! TODO の CRUD エンドポイントを提供する。認証済みユーザーのみアクセス可能。
//!
//! ## エンドポイント
//!
//! - `GET /api/todos` - 一覧取得
//! - `GET /api/todos/{id}` - 単一取得
//! - `POST /api/todos` - 作成（201）
//! - `PUT /api/todos/{id}` - 部分更新
//! - `DELETE /api/todos/{id}` - 削除（204）

use std::sync::Arc;

use axum::{
   Json,
   extract::{Path, State},
   http::StatusCode,
   response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use todolist_domain::todo::{Todo, TodoId, TodoTitle};
use todolist_shared::ApiResponse;
use uuid::Uuid;

use crate::{
   error::ApiError,
   usecase::{TodoUpdate, TodoUseCase},
};

/// TODO ハンドラの共有状態
pub struct TodoState {
   pub usecase: Arc<dyn TodoUseCase>,
}

// --- リクエスト/レスポンス型 ---

/// TODO 作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
   pub title:       String,
   pub description: Option<String>,
}

/// TODO 更新リクエスト
///
/// 省略されたフィールドは現在の値を維持する。
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
   pub title:       Option<String>,
   pub description: Option<String>,
   pub completed:   Option<bool>,
}

/// TODO レスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
   pub id:          Uuid,
   pub title:       String,
   pub description: Option<String>,
   pub completed:   bool,
   pub created_at:  DateTime<Utc>,
   pub updated_at:  DateTime<Utc>,
}

impl From<Todo> for TodoResponse {
   fn from(todo: Todo) -> Self {
      Self {
         id:          *todo.id().as_uuid(),
         title:       todo.title().as_str().to_string(),
         description: todo.description().map(|s| s.to_string()),
         completed:   todo.is_completed(),
         created_at:  todo.created_at(),
         updated_at:  todo.updated_at(),
      }
   }
}

// --- ハンドラ ---

/// GET /api/todos
pub async fn list_todos(
   State(state): State<Arc<TodoState>>,
) -> Result<impl IntoResponse, ApiError> {
   let todos = state.usecase.list().await?;
   let response: Vec<TodoResponse> = todos.into_iter().map(TodoResponse::from).collect();

   Ok(Json(ApiResponse::new(response)))
}

/// GET /api/todos/{id}
pub async fn get_todo(
   State(state): State<Arc<TodoState>>,
   Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
   let todo = state.usecase.get(TodoId::from_uuid(id)).await?;

   Ok(Json(ApiResponse::new(TodoResponse::from(todo))))
}

/// POST /api/todos
pub async fn create_todo(
   State(state): State<Arc<TodoState>>,
   Json(req): Json<CreateTodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let title =
      TodoTitle::new(req.title).map_err(|e| ApiError::validation_field("title", e))?;

   let todo = state.usecase.create(title, req.description).await?;

   Ok((
      StatusCode::CREATED,
      Json(ApiResponse::new(TodoResponse::from(todo))),
   ))
}

/// PUT /api/todos/{id}
pub async fn update_todo(
   State(state): State<Arc<TodoState>>,
   Path(id): Path<Uuid>,
   Json(req): Json<UpdateTodoRequest>,
) -> Result<impl IntoResponse, ApiError> {
   let title = req
      .title
      .map(TodoTitle::new)
      .transpose()
      .map_err(|e| ApiError::validation_field("title", e))?;

   let update = TodoUpdate {
      title,
      description: req.description,
      completed: req.completed,
   };
   let todo = state.usecase.update(TodoId::from_uuid(id), update).await?;

   Ok(Json(ApiResponse::new(TodoResponse::from(todo))))
}

/// DELETE /api/todos/{id}
pub async fn delete_todo(
   State(state): State<Arc<TodoState>>,
   Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
   state.usecase.delete(TodoId::from_uuid(id)).await?;

   Ok(StatusCode::NO_CONTENT)
}
