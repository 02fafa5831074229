//! # TODO ユースケース
//!
//! TODO の CRUD 操作を提供する。
//!
//! ## 設計方針
//!
//! - **部分更新**: 更新リクエストで指定されたフィールドのみ差し替える。
//!   すべて省略された場合も書き込みとして扱い、`updated_at` を進める
//! - **削除は 1 クエリ**: リポジトリの影響行数で存在判定し、
//!   存在確認と削除の間の競合を避ける

use std::sync::Arc;

use async_trait::async_trait;
use todolist_domain::{
   DomainError,
   clock::Clock,
   todo::{Todo, TodoId, TodoTitle},
};
use todolist_infra::repository::TodoRepository;

use crate::error::ApiError;

/// TODO の部分更新内容
///
/// `None` のフィールドは現在の値を維持する。
#[derive(Debug, Default)]
pub struct TodoUpdate {
   pub title:       Option<TodoTitle>,
   pub description: Option<String>,
   pub completed:   Option<bool>,
}

/// TODO ユースケーストレイト
#[async_trait]
pub trait TodoUseCase: Send + Sync {
   /// すべての TODO を作成順で取得する
   async fn list(&self) -> Result<Vec<Todo>, ApiError>;

   /// ID で TODO を取得する
   ///
   /// # Errors
   ///
   /// - 対象が存在しない場合は `DomainError::NotFound`
   async fn get(&self, id: TodoId) -> Result<Todo, ApiError>;

   /// TODO を新規作成する（作成時は必ず未完了）
   async fn create(
      &self,
      title: TodoTitle,
      description: Option<String>,
   ) -> Result<Todo, ApiError>;

   /// TODO を部分更新する
   ///
   /// # Errors
   ///
   /// - 対象が存在しない場合は `DomainError::NotFound`
   async fn update(&self, id: TodoId, update: TodoUpdate) -> Result<Todo, ApiError>;

   /// TODO を削除する
   ///
   /// # Errors
   ///
   /// - 対象が存在しない場合は `DomainError::NotFound`
   async fn delete(&self, id: TodoId) -> Result<(), ApiError>;
}

/// TODO ユースケース実装
pub struct TodoUseCaseImpl {
   repository: Arc<dyn TodoRepository>,
   clock:      Arc<dyn Clock>,
}

impl TodoUseCaseImpl {
   pub fn new(repository: Arc<dyn TodoRepository>, clock: Arc<dyn Clock>) -> Self {
      Self { repository, clock }
   }
}

fn todo_not_found(id: &TodoId) -> ApiError {
   DomainError::NotFound {
      entity_type: "Todo",
      id:          id.to_string(),
   }
   .into()
}

#[async_trait]
impl TodoUseCase for TodoUseCaseImpl {
   async fn list(&self) -> Result<Vec<Todo>, ApiError> {
      Ok(self.repository.find_all().await?)
   }

   async fn get(&self, id: TodoId) -> Result<Todo, ApiError> {
      self
         .repository
         .find_by_id(&id)
         .await?
         .ok_or_else(|| todo_not_found(&id))
   }

   async fn create(
      &self,
      title: TodoTitle,
      description: Option<String>,
   ) -> Result<Todo, ApiError> {
      let todo = Todo::new(TodoId::new(), title, description, self.clock.now());
      self.repository.insert(&todo).await?;

      tracing::info!(todo_id = %todo.id(), "TODO を作成しました");
      Ok(todo)
   }

   async fn update(&self, id: TodoId, update: TodoUpdate) -> Result<Todo, ApiError> {
      let mut todo = self
         .repository
         .find_by_id(&id)
         .await?
         .ok_or_else(|| todo_not_found(&id))?;

      let now = self.clock.now();
      // 指定されたフィールドのみ差し替える。全フィールド省略でも
      // 書き込みとして updated_at は進める。
      todo = todo.touched(now);
      if let Some(title) = update.title {
         todo = todo.with_title(title, now);
      }
      if let Some(description) = update.description {
         todo = todo.with_description(Some(description), now);
      }
      if let Some(completed) = update.completed {
         todo = todo.with_completed(completed, now);
      }

      self.repository.update(&todo).await?;
      Ok(todo)
   }

   async fn delete(&self, id: TodoId) -> Result<(), ApiError> {
      if !self.repository.delete(&id).await? {
         return Err(todo_not_found(&id));
      }

      tracing::info!(todo_id = %id, "TODO を削除しました");
      Ok(())
   }
}
