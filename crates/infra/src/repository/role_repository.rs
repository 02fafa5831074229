//! # RoleRepository
//!
//! ロール情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **参照のみ**: ロールはマイグレーションのシードデータで管理するため、
//!   実行時の操作は検索のみ
//! - **名前解決の一括化**: ユーザー作成・ロール更新時に複数のロール名を
//!   1 クエリで解決する（`= ANY($1)`）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use todolist_domain::role::{Role, RoleId, RoleName};
use uuid::Uuid;

use crate::error::InfraError;

/// ロールリポジトリトレイト
///
/// ロールの検索操作を定義する。
/// ユーザーとロールの関連（user_roles）は UserRepository が担当する。
#[async_trait]
pub trait RoleRepository: Send + Sync {
   /// ロール名でロールを検索する
   async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, InfraError>;

   /// 複数のロール名でロールを一括検索する
   ///
   /// 存在しない名前は無視し、見つかったロールのみ返す。
   /// どの名前が解決できなかったかの判定は呼び出し元が行う。
   async fn find_by_names(&self, names: &[RoleName]) -> Result<Vec<Role>, InfraError>;
}

/// roles テーブルの行構造体
#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
   id:          Uuid,
   name:        String,
   description: Option<String>,
   created_at:  DateTime<Utc>,
   updated_at:  DateTime<Utc>,
}

impl TryFrom<RoleRow> for Role {
   type Error = InfraError;

   fn try_from(row: RoleRow) -> Result<Self, Self::Error> {
      Ok(Role::from_db(
         RoleId::from_uuid(row.id),
         RoleName::new(row.name).map_err(|e| InfraError::unexpected(e.to_string()))?,
         row.description,
         row.created_at,
         row.updated_at,
      ))
   }
}

/// PostgreSQL 実装の RoleRepository
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
   pool: PgPool,
}

impl PostgresRoleRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
   async fn find_by_name(&self, name: &RoleName) -> Result<Option<Role>, InfraError> {
      let row = sqlx::query_as::<_, RoleRow>(
         r#"
            SELECT
                id,
                name,
                description,
                created_at,
                updated_at
            FROM roles
            WHERE name = $1
            "#,
      )
      .bind(name.as_str())
      .fetch_optional(&self.pool)
      .await?;

      row.map(Role::try_from).transpose()
   }

   async fn find_by_names(&self, names: &[RoleName]) -> Result<Vec<Role>, InfraError> {
      if names.is_empty() {
         return Ok(Vec::new());
      }

      let name_strs: Vec<String> = names.iter().map(|n| n.as_str().to_string()).collect();

      let rows = sqlx::query_as::<_, RoleRow>(
         r#"
            SELECT
                id,
                name,
                description,
                created_at,
                updated_at
            FROM roles
            WHERE name = ANY($1)
            ORDER BY name
            "#,
      )
      .bind(name_strs)
      .fetch_all(&self.pool)
      .await?;

      rows.into_iter().map(Role::try_from).collect()
   }
}
