//! # ヘルスチェック共通型
//!
//! `GET /api/health` エンドポイントで使用されるレスポンス型を提供する。
//! チェックの実行（DB 接続確認、メモリ計測）は API 層の責務で、
//! ここには純粋なデータ構造のみを置く。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 稼働ステータス（全体・個別チェック共通）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    /// 正常稼働
    Up,
    /// 利用不可
    Down,
}

impl From<bool> for HealthStatus {
    fn from(healthy: bool) -> Self {
        if healthy { Self::Up } else { Self::Down }
    }
}

/// データベース接続チェックの結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseCheck {
    pub status:  HealthStatus,
    /// データベースエンジンの種類（例: `"PostgreSQL"`）
    #[serde(rename = "type")]
    pub db_type: String,
}

/// アプリケーション自体の稼働チェックの結果
///
/// このレスポンスを組み立てられている時点でプロセスは生きているため、
/// 常に `Up` を返す liveness 相当のチェック。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationCheck {
    pub status:  HealthStatus,
    pub message: String,
}

/// メモリ使用量チェックの結果
///
/// 各値は `"123 MB"` 形式の文字列。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryCheck {
    pub status: HealthStatus,
    pub total:  String,
    pub used:   String,
    pub free:   String,
}

/// 個別チェック結果のコレクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthChecks {
    pub database:    DatabaseCheck,
    pub application: ApplicationCheck,
    pub memory:      MemoryCheck,
}

/// ヘルスチェックレスポンス
///
/// 全体の `status` はデータベースチェックの結果で決まる。
/// `Down` の場合、HTTP ステータスは 503 になる（変換は API 層の責務）。
///
/// ## 使用例
///
/// ```
/// use todolist_shared::HealthStatus;
///
/// let status = HealthStatus::from(true);
/// assert_eq!(status, HealthStatus::Up);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status:      HealthStatus,
    pub timestamp:   DateTime<Utc>,
    /// アプリケーション名
    pub application: String,
    /// アプリケーションバージョン（Cargo.toml から取得）
    pub version:     String,
    pub checks:      HealthChecks,
}
