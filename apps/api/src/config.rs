//! # API サーバー設定
//!
//! 環境変数から API サーバーの設定を読み込む。

use std::env;

/// トークン有効期間のデフォルト（秒）: 24 時間
const DEFAULT_JWT_EXPIRATION_SECS: i64 = 86_400;

/// API サーバーの設定
#[derive(Debug, Clone)]
pub struct ApiConfig {
   /// バインドアドレス
   pub host:                String,
   /// ポート番号
   pub port:                u16,
   /// データベース接続 URL
   pub database_url:        String,
   /// JWT 署名シークレット（base64 エンコード）
   pub jwt_secret:          String,
   /// トークン有効期間（秒）
   pub jwt_expiration_secs: i64,
}

impl ApiConfig {
   /// 環境変数から設定を読み込む
   pub fn from_env() -> Result<Self, env::VarError> {
      Ok(Self {
         host:                env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
         port:                env::var("API_PORT")
            .expect("API_PORT が設定されていません")
            .parse()
            .expect("API_PORT は有効なポート番号である必要があります"),
         database_url:        env::var("DATABASE_URL")
            .expect("DATABASE_URL が設定されていません"),
         jwt_secret:          env::var("JWT_SECRET")
            .expect("JWT_SECRET が設定されていません（base64 エンコードした値を指定してください）"),
         jwt_expiration_secs: env::var("JWT_EXPIRATION")
            .map(|v| {
               v.parse()
                  .expect("JWT_EXPIRATION は秒数（整数）である必要があります")
            })
            .unwrap_or(DEFAULT_JWT_EXPIRATION_SECS),
      })
   }
}
