//! # ユーザー管理ユースケース
//!
//! 管理者向けのユーザー CRUD とロール割り当てを提供する。
//!
//! ## 設計方針
//!
//! - **重複の事前チェック**: ユーザー名・メールアドレスの重複は挿入前に
//!   確認し、競合エラー（409）として返す。最終防衛線は DB の一意制約
//! - **ロールは名前で解決**: リクエストのロール名を一括でロールに解決し、
//!   1 つでも存在しない名前があれば未発見エラー（404）として弾く
//! - **パスワードは即ハッシュ化**: 平文はユースケース内で Argon2id ハッシュに
//!   変換してから永続化する

use std::sync::Arc;

use async_trait::async_trait;
use todolist_domain::{
   DomainError,
   clock::Clock,
   password::PlainPassword,
   role::{DEFAULT_ROLE_NAME, Role, RoleName},
   user::{Email, User, UserId, Username},
};
use todolist_infra::{
   PasswordHasher,
   repository::{RoleRepository, UserRepository},
};

use crate::error::ApiError;

/// ユーザー作成の入力
#[derive(Debug)]
pub struct CreateUser {
   pub username: Username,
   pub email:    Email,
   pub password: PlainPassword,
   /// 割り当てるロール名。空の場合は既定ロール（`ROLE_USER`）を割り当てる
   pub roles:    Vec<RoleName>,
}

/// ユーザー管理ユースケーストレイト
#[async_trait]
pub trait UserUseCase: Send + Sync {
   /// すべてのユーザーをロール付きで作成順に取得する
   async fn list(&self) -> Result<Vec<(User, Vec<Role>)>, ApiError>;

   /// ID でユーザーをロール付きで取得する
   ///
   /// # Errors
   ///
   /// - 対象が存在しない場合は `DomainError::NotFound`
   async fn get(&self, id: UserId) -> Result<(User, Vec<Role>), ApiError>;

   /// ユーザーを新規作成する
   ///
   /// # Errors
   ///
   /// - ユーザー名・メールアドレスが重複している場合は `DomainError::Conflict`
   /// - 指定されたロール名が存在しない場合は `DomainError::NotFound`
   async fn create(&self, input: CreateUser) -> Result<(User, Vec<Role>), ApiError>;

   /// ユーザーのロール割り当てを差し替える
   ///
   /// # Errors
   ///
   /// - 対象ユーザー、または指定されたロール名が存在しない場合は
   ///   `DomainError::NotFound`
   async fn update_roles(
      &self,
      id: UserId,
      role_names: Vec<RoleName>,
   ) -> Result<(User, Vec<Role>), ApiError>;

   /// ユーザーを削除する（ロール割り当ても含む）
   ///
   /// # Errors
   ///
   /// - 対象が存在しない場合は `DomainError::NotFound`
   async fn delete(&self, id: UserId) -> Result<(), ApiError>;
}

/// ユーザー管理ユースケース実装
pub struct UserUseCaseImpl {
   user_repository: Arc<dyn UserRepository>,
   role_repository: Arc<dyn RoleRepository>,
   password_hasher: Arc<dyn PasswordHasher>,
   clock:           Arc<dyn Clock>,
}

impl UserUseCaseImpl {
   pub fn new(
      user_repository: Arc<dyn UserRepository>,
      role_repository: Arc<dyn RoleRepository>,
      password_hasher: Arc<dyn PasswordHasher>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         user_repository,
         role_repository,
         password_hasher,
         clock,
      }
   }

   /// ロール名の一覧をロールに解決する
   ///
   /// 1 つでも存在しない名前があれば `DomainError::NotFound` を返す。
   async fn resolve_roles(&self, names: &[RoleName]) -> Result<Vec<Role>, ApiError> {
      let roles = self.role_repository.find_by_names(names).await?;

      if let Some(missing) = names
         .iter()
         .find(|name| !roles.iter().any(|role| role.name() == *name))
      {
         return Err(
            DomainError::NotFound {
               entity_type: "Role",
               id:          missing.as_str().to_string(),
            }
            .into(),
         );
      }

      Ok(roles)
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
impl UserUseCase for UserUseCaseImpl {
   async fn list(&self) -> Result<Vec<(User, Vec<Role>)>, ApiError> {
      Ok(self.user_repository.find_all().await?)
   }

   async fn get(&self, id: UserId) -> Result<(User, Vec<Role>), ApiError> {
      self
         .user_repository
         .find_by_id(&id)
         .await?
         .ok_or_else(|| user_not_found(&id))
   }

   async fn create(&self, input: CreateUser) -> Result<(User, Vec<Role>), ApiError> {
      if self
         .user_repository
         .exists_by_username(&input.username)
         .await?
      {
         return Err(
            DomainError::Conflict("このユーザー名は既に使用されています".to_string()).into(),
         );
      }
      if self.user_repository.exists_by_email(&input.email).await? {
         return Err(
            DomainError::Conflict("このメールアドレスは既に使用されています".to_string())
               .into(),
         );
      }

      let role_names = if input.roles.is_empty() {
         vec![RoleName::new(DEFAULT_ROLE_NAME).map_err(|e| ApiError::Internal(e.to_string()))?]
      } else {
         input.roles
      };
      let roles = self.resolve_roles(&role_names).await?;

      let password_hash = self.password_hasher.hash(&input.password)?;
      let user = User::new(
         UserId::new(),
         input.username,
         input.email,
         password_hash,
         self.clock.now(),
      );

      let role_ids: Vec<_> = roles.iter().map(|r| r.id().clone()).collect();
      self.user_repository.insert(&user, &role_ids).await?;

      tracing::info!(user_id = %user.id(), username = %user.username(), "ユーザーを作成しました");
      Ok((user, roles))
   }

   async fn update_roles(
      &self,
      id: UserId,
      role_names: Vec<RoleName>,
   ) -> Result<(User, Vec<Role>), ApiError> {
      let (user, _) = self
         .user_repository
         .find_by_id(&id)
         .await?
         .ok_or_else(|| user_not_found(&id))?;

      let roles = self.resolve_roles(&role_names).await?;
      let role_ids: Vec<_> = roles.iter().map(|r| r.id().clone()).collect();
      let now = self.clock.now();

      self
         .user_repository
         .replace_roles(user.id(), &role_ids, now)
         .await?;
      tracing::info!(user_id = %user.id(), "ロール割り当てを更新しました");

      // updated_at が進んだ状態を返すため再取得する
      let (user, _) = self
         .user_repository
         .find_by_id(&id)
         .await?
         .ok_or_else(|| user_not_found(&id))?;
      Ok((user, roles))
   }

   async fn delete(&self, id: UserId) -> Result<(), ApiError> {
      if !self.user_repository.delete(&id).await? {
         return Err(user_not_found(&id));
      }

      tracing::info!(user_id = %id, "ユーザーを削除しました");
      Ok(())
   }
}
