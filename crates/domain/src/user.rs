//! # ユーザー
//!
//! ユーザーエンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`User`] | ユーザー | ログイン主体。ロールの割り当て先 |
//! | [`Username`] | ユーザー名 | ログイン ID。全ユーザーで一意 |
//! | [`Email`] | メールアドレス | 全ユーザーで一意 |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: UserId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use todolist_domain::{
//!     password::PasswordHash,
//!     user::{Email, User, UserId, Username},
//! };
//!
//! // 新規ユーザー作成
//! let user = User::new(
//!     UserId::new(),
//!     Username::new("yamada")?,
//!     Email::new("user@example.com")?,
//!     PasswordHash::new("$argon2id$v=19$..."),
//!     chrono::Utc::now(),
//! );
//!
//! // 作成直後は有効
//! assert!(user.can_login());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

use crate::{DomainError, password::PasswordHash};

define_uuid_id! {
    /// ユーザー ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    /// Newtype パターンで型安全性を確保。
    pub struct UserId;
}

define_validated_string! {
    /// ユーザー名（値オブジェクト）
    ///
    /// ログイン ID として使用する。最大 50 文字。
    /// 一意性の保証はリポジトリ層（DB の一意制約）が担う。
    pub struct Username {
        label: "ユーザー名",
        max_length: 50,
    }
}

/// メールアドレス（値オブジェクト）
///
/// `local@domain` 形式を要求する。
/// 生成時にバリデーションを実行し、不正な値の作成を防ぐ。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - `@` を含む
    /// - 最大 255 文字
    ///
    /// # エラー
    ///
    /// バリデーションに失敗した場合は `DomainError::Validation` を返す。
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();

        if value.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスは必須です".to_string(),
            ));
        }

        // 基本的な構造検証: local@domain の形式であること
        let Some((local, domain)) = value.split_once('@') else {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        };

        if local.is_empty() || domain.is_empty() {
            return Err(DomainError::Validation(
                "メールアドレスの形式が不正です".to_string(),
            ));
        }

        if value.len() > 255 {
            return Err(DomainError::Validation(
                "メールアドレスは255文字以内である必要があります".to_string(),
            ));
        }

        Ok(Self(value))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 所有権を持つ文字列に変換する
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーエンティティ
///
/// システムのユーザーを表現する。ユーザー名・パスワードで認証し、
/// 割り当てられたロールに応じて操作が許可される。
/// ロールの割り当て自体は `user_roles` テーブル（リポジトリ層）で管理する。
///
/// # 不変条件
///
/// - `username` と `email` は全ユーザーで一意
/// - `enabled` が false の場合、ログイン不可
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    email: Email,
    password_hash: PasswordHash,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// 新しいユーザーを作成する
    ///
    /// # 引数
    ///
    /// - `id`: ユーザー ID
    /// - `username`: ユーザー名
    /// - `email`: メールアドレス
    /// - `password_hash`: ハッシュ化済みパスワード（平文は受け取らない）
    /// - `now`: 現在日時（呼び出し元から注入）
    ///
    /// # 不変条件
    ///
    /// - 作成時は有効（`enabled == true`）
    pub fn new(
        id: UserId,
        username: Username,
        email: Email,
        password_hash: PasswordHash,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータからユーザーを復元する（データベースから取得時）
    pub fn from_db(
        id: UserId,
        username: Username,
        email: Email,
        password_hash: PasswordHash,
        enabled: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            enabled,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ビジネスロジックメソッド

    /// ユーザーがログイン可能か判定する
    ///
    /// 有効（`enabled == true`）の場合に true を返す。
    pub fn can_login(&self) -> bool {
        self.enabled
    }

    /// 有効フラグを変更した新しいインスタンスを返す
    pub fn with_enabled(self, enabled: bool, now: DateTime<Utc>) -> Self {
        Self {
            enabled,
            updated_at: now,
            ..self
        }
    }
}
