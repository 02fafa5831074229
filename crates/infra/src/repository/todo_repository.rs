//! # TodoRepository
//!
//! TODO の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **行構造体で復元**: `sqlx::FromRow` の行構造体を経由してエンティティに変換
//! - **削除は件数で判定**: `DELETE` の影響行数を返し、存在チェックと削除を
//!   1 クエリにまとめる（存在確認 → 削除の間の競合を避ける）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use todolist_domain::todo::{Todo, TodoId, TodoTitle};
use uuid::Uuid;

use crate::error::InfraError;

/// TODO リポジトリトレイト
///
/// TODO の永続化操作を定義する。
/// インフラ層で具体的な実装を提供し、ユースケース層から利用する。
#[async_trait]
pub trait TodoRepository: Send + Sync {
   /// ID で TODO を検索する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some(todo))`: TODO が見つかった場合
   /// - `Ok(None)`: TODO が見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, InfraError>;

   /// すべての TODO を作成順で取得する
   async fn find_all(&self) -> Result<Vec<Todo>, InfraError>;

   /// TODO を挿入する
   async fn insert(&self, todo: &Todo) -> Result<(), InfraError>;

   /// TODO を更新する（タイトル、説明、完了フラグ、更新日時）
   async fn update(&self, todo: &Todo) -> Result<(), InfraError>;

   /// TODO を削除する
   ///
   /// # 戻り値
   ///
   /// - `Ok(true)`: 削除した場合
   /// - `Ok(false)`: 対象が存在しなかった場合
   async fn delete(&self, id: &TodoId) -> Result<bool, InfraError>;
}

/// todos テーブルの行構造体
#[derive(Debug, sqlx::FromRow)]
struct TodoRow {
   id:          Uuid,
   title:       String,
   description: Option<String>,
   completed:   bool,
   created_at:  DateTime<Utc>,
   updated_at:  DateTime<Utc>,
}

impl TryFrom<TodoRow> for Todo {
   type Error = InfraError;

   fn try_from(row: TodoRow) -> Result<Self, Self::Error> {
      Ok(Todo::from_db(
         TodoId::from_uuid(row.id),
         TodoTitle::new(row.title).map_err(|e| InfraError::unexpected(e.to_string()))?,
         row.description,
         row.completed,
         row.created_at,
         row.updated_at,
      ))
   }
}

/// PostgreSQL 実装の TodoRepository
#[derive(Debug, Clone)]
pub struct PostgresTodoRepository {
   pool: PgPool,
}

impl PostgresTodoRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl TodoRepository for PostgresTodoRepository {
   async fn find_by_id(&self, id: &TodoId) -> Result<Option<Todo>, InfraError> {
      let row = sqlx::query_as::<_, TodoRow>(
         r#"
            SELECT
                id,
                title,
                description,
                completed,
                created_at,
                updated_at
            FROM todos
            WHERE id = $1
            "#,
      )
      .bind(id.as_uuid())
      .fetch_optional(&self.pool)
      .await?;

      row.map(Todo::try_from).transpose()
   }

   async fn find_all(&self) -> Result<Vec<Todo>, InfraError> {
      let rows = sqlx::query_as::<_, TodoRow>(
         r#"
            SELECT
                id,
                title,
                description,
                completed,
                created_at,
                updated_at
            FROM todos
            ORDER BY created_at
            "#,
      )
      .fetch_all(&self.pool)
      .await?;

      rows.into_iter().map(Todo::try_from).collect()
   }

   async fn insert(&self, todo: &Todo) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            INSERT INTO todos (id, title, description, completed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
      )
      .bind(todo.id().as_uuid())
      .bind(todo.title().as_str())
      .bind(todo.description())
      .bind(todo.is_completed())
      .bind(todo.created_at())
      .bind(todo.updated_at())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn update(&self, todo: &Todo) -> Result<(), InfraError> {
      sqlx::query(
         r#"
            UPDATE todos
            SET title = $2, description = $3, completed = $4, updated_at = $5
            WHERE id = $1
            "#,
      )
      .bind(todo.id().as_uuid())
      .bind(todo.title().as_str())
      .bind(todo.description())
      .bind(todo.is_completed())
      .bind(todo.updated_at())
      .execute(&self.pool)
      .await?;

      Ok(())
   }

   async fn delete(&self, id: &TodoId) -> Result<bool, InfraError> {
      let result = sqlx::query("DELETE FROM todos WHERE id = $1")
         .bind(id.as_uuid())
         .execute(&self.pool)
         .await?;

      Ok(result.rows_affected() > 0)
   }
}
