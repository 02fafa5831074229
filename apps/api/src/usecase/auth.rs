//! # 認証ユースケース
//!
//! ログイン・ユーザー登録・現在ユーザーの取得を提供する。
//!
//! ## 設計方針
//!
//! - **失敗理由を区別しない**: ログイン失敗はユーザー不在・無効化・
//!   パスワード不一致のいずれでも同一のエラーを返し、ユーザーの存在有無を
//!   推測されないようにする
//! - **登録は参照操作を先に**: 重複チェックとロール解決を済ませてから
//!   書き込みを行い、失敗時にデータを残さない
//! - **現在ユーザーはストレージを再参照**: トークンのクレームだけで応答せず、
//!   ユーザー名でデータベースを引き直す。削除済みユーザーのトークンは
//!   ここで未発見エラーになる

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
   Claims,
   JwtService,
   PasswordChecker,
   PasswordHasher,
   repository::{RoleRepository, UserRepository},
};

use crate::error::ApiError;

/// 認証に成功したユーザーと発行済みトークン
#[derive(Debug)]
pub struct AuthenticatedUser {
   pub token: String,
   pub user:  User,
   pub roles: Vec<Role>,
}

/// ユーザー登録の入力
#[derive(Debug)]
pub struct RegisterUser {
   pub username: Username,
   pub email:    Email,
   pub password: PlainPassword,
   /// 割り当てるロール名。空の場合は既定ロール（`ROLE_USER`）を割り当てる
   pub roles:    Vec<RoleName>,
}

/// 認証ユースケーストレイト
#[async_trait]
pub trait AuthUseCase: Send + Sync {
   /// ユーザー名とパスワードで認証し、トークンを発行する
   ///
   /// # Errors
   ///
   /// - 認証に失敗した場合は `ApiError::AuthenticationFailed`。
   ///   ユーザー不在・無効化・パスワード不一致を区別しない
   async fn login(
      &self,
      username: &str,
      password: PlainPassword,
   ) -> Result<AuthenticatedUser, ApiError>;

   /// ユーザーを登録し、トークンを発行する
   ///
   /// # Errors
   ///
   /// - ユーザー名・メールアドレスが重複している場合は `DomainError::Conflict`
   /// - 指定されたロール名が存在しない場合は `DomainError::NotFound`
   async fn register(&self, input: RegisterUser) -> Result<AuthenticatedUser, ApiError>;

   /// トークンのクレームから現在のユーザーを取得する
   ///
   /// # Errors
   ///
   /// - ユーザーが既に削除されている場合は `DomainError::NotFound`
   async fn current_user(&self, claims: &Claims) -> Result<(User, Vec<Role>), ApiError>;
}

/// 認証ユースケース実装
pub struct AuthUseCaseImpl {
   user_repository:  Arc<dyn UserRepository>,
   role_repository:  Arc<dyn RoleRepository>,
   password_hasher:  Arc<dyn PasswordHasher>,
   password_checker: Arc<dyn PasswordChecker>,
   jwt:              Arc<JwtService>,
   clock:            Arc<dyn Clock>,
}

impl AuthUseCaseImpl {
   pub fn new(
      user_repository: Arc<dyn UserRepository>,
      role_repository: Arc<dyn RoleRepository>,
      password_hasher: Arc<dyn PasswordHasher>,
      password_checker: Arc<dyn PasswordChecker>,
      jwt: Arc<JwtService>,
      clock: Arc<dyn Clock>,
   ) -> Self {
      Self {
         user_repository,
         role_repository,
         password_hasher,
         password_checker,
         jwt,
         clock,
      }
   }
}

#[async_trait]
impl AuthUseCase for AuthUseCaseImpl {
   async fn login(
      &self,
      username: &str,
      password: PlainPassword,
   ) -> Result<AuthenticatedUser, ApiError> {
      // ユーザー名として不正な入力も認証失敗として扱う
      let username =
         Username::new(username).map_err(|_| ApiError::AuthenticationFailed)?;

      let Some((user, roles)) = self.user_repository.find_by_username(&username).await? else {
         return Err(ApiError::AuthenticationFailed);
      };

      if !user.can_login() {
         tracing::debug!(username = %user.username(), "無効化されたユーザーのログイン試行");
         return Err(ApiError::AuthenticationFailed);
      }

      if self
         .password_checker
         .verify(&password, user.password_hash())?
         .is_mismatch()
      {
         return Err(ApiError::AuthenticationFailed);
      }

      let token = self.jwt.issue(&user, &roles, self.clock.now())?;
      tracing::info!(username = %user.username(), "ログインしました");

      Ok(AuthenticatedUser { token, user, roles })
   }

   async fn register(&self, input: RegisterUser) -> Result<AuthenticatedUser, ApiError> {
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
      let roles = self.role_repository.find_by_names(&role_names).await?;
      if let Some(missing) = role_names
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

      let now = self.clock.now();
      let password_hash = self.password_hasher.hash(&input.password)?;
      let user = User::new(
         UserId::new(),
         input.username,
         input.email,
         password_hash,
         now,
      );

      let role_ids: Vec<_> = roles.iter().map(|r| r.id().clone()).collect();
      self.user_repository.insert(&user, &role_ids).await?;

      let token = self.jwt.issue(&user, &roles, now)?;
      tracing::info!(username = %user.username(), "ユーザーを登録しました");

      Ok(AuthenticatedUser { token, user, roles })
   }

   async fn current_user(&self, claims: &Claims) -> Result<(User, Vec<Role>), ApiError> {
      let username = Username::new(&claims.sub)
         .map_err(|e| ApiError::Internal(format!("クレームのユーザー名が不正です: {e}")))?;

      self
         .user_repository
         .find_by_username(&username)
         .await?
         .ok_or_else(|| {
            DomainError::NotFound {
               entity_type: "User",
               id:          claims.sub.clone(),
            }
            .into()
         })
   }
}
