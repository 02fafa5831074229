//! # TODO
//!
//! TODO エンティティとそれに関連する値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 用途 |
//! |---|------------|------|
//! | [`Todo`] | TODO（タスク） | タイトル・説明・完了フラグを持つ作業単位 |
//! | [`TodoTitle`] | タイトル | 必須、最大 255 文字 |
//!
//! ## 設計方針
//!
//! - **Newtype パターン**: TodoId は UUID をラップし、型安全性を確保
//! - **不変性**: エンティティフィールドは基本的に不変、変更はメソッド経由
//! - **バリデーション**: 値オブジェクトの生成時に検証ロジックを実行
//!
//! ## 使用例
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use todolist_domain::todo::{Todo, TodoId, TodoTitle};
//!
//! // 新規 TODO 作成
//! let todo = Todo::new(
//!     TodoId::new(),
//!     TodoTitle::new("牛乳を買う")?,
//!     Some("低脂肪のもの".to_string()),
//!     chrono::Utc::now(),
//! );
//!
//! // 作成直後は未完了
//! assert!(!todo.is_completed());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};

define_uuid_id! {
    /// TODO ID（一意識別子）
    ///
    /// UUID v7 を使用し、生成順にソート可能。
    /// Newtype パターンで型安全性を確保。
    pub struct TodoId;
}

define_validated_string! {
    /// TODO タイトル（値オブジェクト）
    ///
    /// 空白のみの入力を拒否し、最大 255 文字まで受け付ける。
    pub struct TodoTitle {
        label: "タイトル",
        max_length: 255,
    }
}

/// TODO エンティティ
///
/// ユーザーが管理する作業単位を表現する。
/// 作成 → 任意フィールドの更新 → 削除というライフサイクルを持つ。
///
/// # 不変条件
///
/// - 作成時の `completed` は必ず false
/// - 書き込みのたびに `updated_at` が進む
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    id: TodoId,
    title: TodoTitle,
    description: Option<String>,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Todo {
    /// 新しい TODO を作成する
    ///
    /// # 引数
    ///
    /// - `id`: TODO ID
    /// - `title`: タイトル
    /// - `description`: 説明（任意）
    /// - `now`: 現在日時（呼び出し元から注入）
    ///
    /// # 不変条件
    ///
    /// - 作成時の完了フラグは false
    pub fn new(
        id: TodoId,
        title: TodoTitle,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 既存のデータから TODO を復元する（データベースから取得時）
    pub fn from_db(
        id: TodoId,
        title: TodoTitle,
        description: Option<String>,
        completed: bool,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            completed,
            created_at,
            updated_at,
        }
    }

    // Getter メソッド

    pub fn id(&self) -> &TodoId {
        &self.id
    }

    pub fn title(&self) -> &TodoTitle {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // 不変更新メソッド

    /// タイトルを変更した新しいインスタンスを返す
    pub fn with_title(self, title: TodoTitle, now: DateTime<Utc>) -> Self {
        Self {
            title,
            updated_at: now,
            ..self
        }
    }

    /// 説明を変更した新しいインスタンスを返す
    pub fn with_description(self, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            description,
            updated_at: now,
            ..self
        }
    }

    /// 完了フラグを変更した新しいインスタンスを返す
    pub fn with_completed(self, completed: bool, now: DateTime<Utc>) -> Self {
        Self {
            completed,
            updated_at: now,
            ..self
        }
    }

    /// 更新日時のみを進めた新しいインスタンスを返す
    ///
    /// 更新リクエストで対象フィールドがすべて省略された場合でも、
    /// 書き込みが行われたことを `updated_at` に記録する。
    pub fn touched(self, now: DateTime<Utc>) -> Self {
        Self {
            updated_at: now,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    use super::*;

    // フィクスチャ

    /// テスト用の固定タイムスタンプ
    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    /// 更新日時として now() とは異なるタイムスタンプを使用する
    #[fixture]
    fn later() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_001_000, 0).unwrap()
    }

    #[fixture]
    fn pending_todo(now: DateTime<Utc>) -> Todo {
        Todo::new(
            TodoId::new(),
            TodoTitle::new("牛乳を買う").unwrap(),
            Some("低脂肪のもの".to_string()),
            now,
        )
    }

    // TodoTitle のテスト

    #[test]
    fn test_タイトルは正常な値を受け入れる() {
        assert!(TodoTitle::new("牛乳を買う").is_ok());
    }

    #[test]
    fn test_タイトルは前後の空白を除去する() {
        let title = TodoTitle::new("  牛乳を買う  ").unwrap();
        assert_eq!(title.as_str(), "牛乳を買う");
    }

    #[rstest]
    #[case("", "空文字列")]
    #[case("   ", "空白のみ")]
    #[case(&"あ".repeat(256), "255文字超過")]
    fn test_タイトルは不正な値を拒否する(#[case] input: &str, #[case] _reason: &str) {
        assert!(TodoTitle::new(input).is_err());
    }

    #[test]
    fn test_タイトルは255文字まで受け入れる() {
        assert!(TodoTitle::new("あ".repeat(255)).is_ok());
    }

    // Todo のテスト

    #[rstest]
    fn test_新規todoは未完了で作成される(pending_todo: Todo) {
        assert!(!pending_todo.is_completed());
    }

    #[rstest]
    fn test_新規todoのcreated_atとupdated_atは注入された値と一致する(
        now: DateTime<Utc>,
        pending_todo: Todo,
    ) {
        assert_eq!(pending_todo.created_at(), now);
        assert_eq!(pending_todo.updated_at(), now);
    }

    #[rstest]
    fn test_完了フラグ変更後の状態(pending_todo: Todo, later: DateTime<Utc>) {
        let original = pending_todo.clone();
        let sut = pending_todo.with_completed(true, later);

        let expected = Todo::from_db(
            original.id().clone(),
            original.title().clone(),
            original.description().map(|s| s.to_string()),
            true,
            original.created_at(),
            later,
        );
        assert_eq!(sut, expected);
    }

    #[rstest]
    fn test_タイトル変更後の状態(pending_todo: Todo, later: DateTime<Utc>) {
        let original = pending_todo.clone();
        let new_title = TodoTitle::new("パンを買う").unwrap();
        let sut = pending_todo.with_title(new_title.clone(), later);

        let expected = Todo::from_db(
            original.id().clone(),
            new_title,
            original.description().map(|s| s.to_string()),
            original.is_completed(),
            original.created_at(),
            later,
        );
        assert_eq!(sut, expected);
    }

    #[rstest]
    fn test_説明は削除できる(pending_todo: Todo, later: DateTime<Utc>) {
        let updated = pending_todo.with_description(None, later);

        assert_eq!(updated.description(), None);
        assert_eq!(updated.updated_at(), later);
    }

    #[rstest]
    fn test_touchedは更新日時のみを進める(pending_todo: Todo, later: DateTime<Utc>) {
        let original = pending_todo.clone();
        let sut = pending_todo.touched(later);

        let expected = Todo::from_db(
            original.id().clone(),
            original.title().clone(),
            original.description().map(|s| s.to_string()),
            original.is_completed(),
            original.created_at(),
            later,
        );
        assert_eq!(sut, expected);
    }
}
