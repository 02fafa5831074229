//! # ロール（権限管理）
//!
//! ユーザーに割り当てるロールを管理する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Role`] | ロール（役割） | RBAC の割り当て単位。「管理者」「一般ユーザー」等 |
//! | [`RoleName`] | ロール名 | `ROLE_USER` のような一意な権限名。トークンにもこの名前が載る |
//!
//! ## 設計方針
//!
//! - **シードデータ管理**: ロールはマイグレーションで投入し、API からは参照のみ
//! - **名前がそのまま権限**: ロール名がトークンの authority として使われる
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use todolist_domain::role::{Role, RoleId, RoleName};
//!
//! let role = Role::new(
//!    RoleId::new(),
//!    RoleName::new("ROLE_USER")?,
//!    Some("一般ユーザー".to_string()),
//!    chrono::Utc::now(),
//! );
//!
//! assert_eq!(role.name().as_str(), "ROLE_USER");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

/// 登録時に割り当てる既定ロール名
pub const DEFAULT_ROLE_NAME: &str = "ROLE_USER";

/// 管理者ロール名
pub const ADMIN_ROLE_NAME: &str = "ROLE_ADMIN";

define_uuid_id! {
   /// ロール ID（一意識別子）
   pub struct RoleId;
}

define_validated_string! {
   /// ロール名（値オブジェクト）
   ///
   /// `ROLE_USER` / `ROLE_ADMIN` のような権限名。最大 50 文字。
   /// 一意性の保証はリポジトリ層（DB の一意制約）が担う。
   pub struct RoleName {
      label: "ロール名",
      max_length: 50,
   }
}

/// ロールエンティティ
///
/// ユーザーに割り当てられる権限のグループ。
/// マイグレーションのシードデータで管理し、実行時には参照のみ行う。
///
/// # 不変条件
///
/// - `name` は全ロールで一意
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
   id:          RoleId,
   name:        RoleName,
   description: Option<String>,
   created_at:  DateTime<Utc>,
   updated_at:  DateTime<Utc>,
}

impl Role {
   /// 新しいロールを作成する
   ///
   /// # 引数
   ///
   /// - `id`: ロール ID
   /// - `name`: ロール名
   /// - `description`: 説明
   /// - `now`: 現在日時（呼び出し元から注入）
   pub fn new(
      id: RoleId,
      name: RoleName,
      description: Option<String>,
      now: DateTime<Utc>,
   ) -> Self {
      Self {
         id,
         name,
         description,
         created_at: now,
         updated_at: now,
      }
   }

   /// 既存のデータからロールを復元する（データベースから取得時）
   pub fn from_db(
      id: RoleId,
      name: RoleName,
      description: Option<String>,
      created_at: DateTime<Utc>,
      updated_at: DateTime<Utc>,
   ) -> Self {
      Self {
         id,
         name,
         description,
         created_at,
         updated_at,
      }
   }

   // Getter メソッド

   pub fn id(&self) -> &RoleId {
      &self.id
   }

   pub fn name(&self) -> &RoleName {
      &self.name
   }

   pub fn description(&self) -> Option<&str> {
      self.description.as_deref()
   }

   pub fn created_at(&self) -> DateTime<Utc> {
      self.created_at
   }

   pub fn updated_at(&self) -> DateTime<Utc> {
      self.updated_at
   }
}
