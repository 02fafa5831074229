//! # UserRepository
//!
//! ユーザー情報の永続化を担当するリポジトリ。
//!
//! ## 設計方針
//!
//! - **ロールの一括取得**: N+1 問題を避けるため JOIN で取得し、
//!   `itertools::into_group_map` でユーザー単位にまとめる
//! - **書き込みはトランザクション**: users と user_roles の 2 テーブルに
//!   またがる書き込み（作成・ロール差し替え・削除）は 1 トランザクションで行う
//! - **削除は件数で判定**: `DELETE` の影響行数を返し、存在チェックと削除を
//!   1 クエリにまとめる

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools as _;
use sqlx::PgPool;
use todolist_domain::{
   password::PasswordHash,
   role::{Role, RoleId, RoleName},
   user::{Email, User, UserId, Username},
};
use uuid::Uuid;

use crate::error::InfraError;

/// ユーザーリポジトリトレイト
///
/// ユーザー情報の永続化操作を定義する。
/// ユーザーとロールの関連（user_roles）の管理もここで担当する。
#[async_trait]
pub trait UserRepository: Send + Sync {
   /// ID でユーザーをロール付きで検索する
   ///
   /// # 戻り値
   ///
   /// - `Ok(Some((user, roles)))`: ユーザーが見つかった場合
   /// - `Ok(None)`: ユーザーが見つからない場合
   /// - `Err(_)`: データベースエラー
   async fn find_by_id(&self, id: &UserId) -> Result<Option<(User, Vec<Role>)>, InfraError>;

   /// ユーザー名でユーザーをロール付きで検索する
   ///
   /// ログイン時の認証、およびトークンのサブジェクト解決で使用する。
   async fn find_by_username(
      &self,
      username: &Username,
   ) -> Result<Option<(User, Vec<Role>)>, InfraError>;

   /// すべてのユーザーをロール付きで作成順に取得する
   async fn find_all(&self) -> Result<Vec<(User, Vec<Role>)>, InfraError>;

   /// ユーザー名が既に存在するか確認する
   async fn exists_by_username(&self, username: &Username) -> Result<bool, InfraError>;

   /// メールアドレスが既に存在するか確認する
   async fn exists_by_email(&self, email: &Email) -> Result<bool, InfraError>;

   /// ユーザーをロール割り当てとともに挿入する
   async fn insert(&self, user: &User, role_ids: &[RoleId]) -> Result<(), InfraError>;

   /// ユーザーのロール割り当てを差し替える
   ///
   /// 既存の割り当てをすべて削除し、`role_ids` で置き換える。
   /// ユーザー行の `updated_at` も `updated_at` 引数で更新する。
   async fn replace_roles(
      &self,
      user_id: &UserId,
      role_ids: &[RoleId],
      updated_at: DateTime<Utc>,
   ) -> Result<(), InfraError>;

   /// ユーザーを削除する（ロール割り当ても含む）
   ///
   /// # 戻り値
   ///
   /// - `Ok(true)`: 削除した場合
   /// - `Ok(false)`: 対象が存在しなかった場合
   async fn delete(&self, id: &UserId) -> Result<bool, InfraError>;
}

/// users とロールの LEFT JOIN 行構造体
///
/// ロールを持たないユーザーも取得できるよう、ロール列はすべて Option。
#[derive(Debug, sqlx::FromRow)]
struct UserRoleJoinRow {
   id:               Uuid,
   username:         String,
   email:            String,
   password_hash:    String,
   enabled:          bool,
   created_at:       DateTime<Utc>,
   updated_at:       DateTime<Utc>,
   role_id:          Option<Uuid>,
   role_name:        Option<String>,
   role_description: Option<String>,
   role_created_at:  Option<DateTime<Utc>>,
   role_updated_at:  Option<DateTime<Utc>>,
}

impl UserRoleJoinRow {
   /// 行のユーザー部分をエンティティに変換する
   fn to_user(&self) -> Result<User, InfraError> {
      Ok(User::from_db(
         UserId::from_uuid(self.id),
         Username::new(&self.username).map_err(|e| InfraError::unexpected(e.to_string()))?,
         Email::new(&self.email).map_err(|e| InfraError::unexpected(e.to_string()))?,
         PasswordHash::new(&self.password_hash),
         self.enabled,
         self.created_at,
         self.updated_at,
      ))
   }

   /// 行のロール部分をエンティティに変換する（LEFT JOIN で NULL の場合は None）
   fn to_role(&self) -> Result<Option<Role>, InfraError> {
      let (Some(id), Some(name), Some(created_at), Some(updated_at)) = (
         self.role_id,
         self.role_name.as_deref(),
         self.role_created_at,
         self.role_updated_at,
      ) else {
         return Ok(None);
      };

      Ok(Some(Role::from_db(
         RoleId::from_uuid(id),
         RoleName::new(name).map_err(|e| InfraError::unexpected(e.to_string()))?,
         self.role_description.clone(),
         created_at,
         updated_at,
      )))
   }
}

/// JOIN 行の集合を `(User, Vec<Role>)` に畳み込む
///
/// 先頭行からユーザーを復元し、各行のロール部分を集める。
fn fold_rows(rows: Vec<UserRoleJoinRow>) -> Result<Option<(User, Vec<Role>)>, InfraError> {
   let Some(first) = rows.first() else {
      return Ok(None);
   };

   let user = first.to_user()?;
   let roles = rows
      .iter()
      .map(UserRoleJoinRow::to_role)
      .filter_map(Result::transpose)
      .collect::<Result<Vec<_>, _>>()?;

   Ok(Some((user, roles)))
}

/// ユーザーとロールを JOIN する SELECT 句（WHERE 句は呼び出し側で付加）
const SELECT_USERS_WITH_ROLES: &str = r#"
    SELECT
        u.id,
        u.username,
        u.email,
        u.password_hash,
        u.enabled,
        u.created_at,
        u.updated_at,
        r.id AS role_id,
        r.name AS role_name,
        r.description AS role_description,
        r.created_at AS role_created_at,
        r.updated_at AS role_updated_at
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

/// PostgreSQL 実装の UserRepository
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
   pool: PgPool,
}

impl PostgresUserRepository {
   /// 新しいリポジトリインスタンスを作成
   pub fn new(pool: PgPool) -> Self {
      Self { pool }
   }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
   async fn find_by_id(&self, id: &UserId) -> Result<Option<(User, Vec<Role>)>, InfraError> {
      let query = format!("{SELECT_USERS_WITH_ROLES} WHERE u.id = $1");
      let rows = sqlx::query_as::<_, UserRoleJoinRow>(&query)
         .bind(id.as_uuid())
         .fetch_all(&self.pool)
         .await?;

      fold_rows(rows)
   }

   async fn find_by_username(
      &self,
      username: &Username,
   ) -> Result<Option<(User, Vec<Role>)>, InfraError> {
      let query = format!("{SELECT_USERS_WITH_ROLES} WHERE u.username = $1");
      let rows = sqlx::query_as::<_, UserRoleJoinRow>(&query)
         .bind(username.as_str())
         .fetch_all(&self.pool)
         .await?;

      fold_rows(rows)
   }

   async fn find_all(&self) -> Result<Vec<(User, Vec<Role>)>, InfraError> {
      let rows = sqlx::query_as::<_, UserRoleJoinRow>(SELECT_USERS_WITH_ROLES)
         .fetch_all(&self.pool)
         .await?;

      // ユーザー ID でグループ化し、作成順に並べ直す
      let grouped = rows.into_iter().map(|row| (row.id, row)).into_group_map();

      let mut users: Vec<(User, Vec<Role>)> = grouped
         .into_values()
         .filter_map(|rows| fold_rows(rows).transpose())
         .collect::<Result<Vec<_>, _>>()?;

      users.sort_by_key(|(user, _)| user.created_at());

      Ok(users)
   }

   async fn exists_by_username(&self, username: &Username) -> Result<bool, InfraError> {
      let exists: (bool,) =
         sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username.as_str())
            .fetch_one(&self.pool)
            .await?;

      Ok(exists.0)
   }

   async fn exists_by_email(&self, email: &Email) -> Result<bool, InfraError> {
      let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
         .bind(email.as_str())
         .fetch_one(&self.pool)
         .await?;

      Ok(exists.0)
   }

   async fn insert(&self, user: &User, role_ids: &[RoleId]) -> Result<(), InfraError> {
      let mut tx = self.pool.begin().await?;

      sqlx::query(
         r#"
            INSERT INTO users (id, username, email, password_hash, enabled, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
      )
      .bind(user.id().as_uuid())
      .bind(user.username().as_str())
      .bind(user.email().as_str())
      .bind(user.password_hash().as_str())
      .bind(user.is_enabled())
      .bind(user.created_at())
      .bind(user.updated_at())
      .execute(&mut *tx)
      .await?;

      for role_id in role_ids {
         sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user.id().as_uuid())
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await?;
      }

      tx.commit().await?;
      Ok(())
   }

   async fn replace_roles(
      &self,
      user_id: &UserId,
      role_ids: &[RoleId],
      updated_at: DateTime<Utc>,
   ) -> Result<(), InfraError> {
      let mut tx = self.pool.begin().await?;

      sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
         .bind(user_id.as_uuid())
         .execute(&mut *tx)
         .await?;

      for role_id in role_ids {
         sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
            .bind(user_id.as_uuid())
            .bind(role_id.as_uuid())
            .execute(&mut *tx)
            .await?;
      }

      sqlx::query("UPDATE users SET updated_at = $2 WHERE id = $1")
         .bind(user_id.as_uuid())
         .bind(updated_at)
         .execute(&mut *tx)
         .await?;

      tx.commit().await?;
      Ok(())
   }

   async fn delete(&self, id: &UserId) -> Result<bool, InfraError> {
      let mut tx = self.pool.begin().await?;

      // user_roles は ON DELETE CASCADE でも消えるが、依存を明示して先に削除する
      sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
         .bind(id.as_uuid())
         .execute(&mut *tx)
         .await?;

      let result = sqlx::query("DELETE FROM users WHERE id = $1")
         .bind(id.as_uuid())
         .execute(&mut *tx)
         .await?;

      tx.commit().await?;
      Ok(result.rows_affected() > 0)
   }
}
