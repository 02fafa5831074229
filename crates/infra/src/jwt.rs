//! # JWT の発行・検証
//!
//! `jsonwebtoken` による署名付きトークン（HS256）の発行と検証を提供する。
//!
//! ## 設計方針
//!
//! - **ステートレス**: トークン検証はサーバー側の状態を参照しない。
//!   検証済みクレームのみでリクエストの認証・認可を判断する
//! - **leeway ゼロ**: 検証に猶予を与えず、`exp` を 1 秒でも過ぎたトークンは
//!   無効とする（`exp` ちょうどの秒まではまだ有効）
//! - **シークレットは base64**: 設定値は base64 エンコードされた文字列で受け取り、
//!   デコードしたバイト列を署名鍵として使用する
//!
//! ## クレーム構成
//!
//! | クレーム | 内容 |
//! |---------|------|
//! | `sub` | ユーザー名 |
//! | `email` | メールアドレス |
//! | `roles` | ロール名の配列（authority） |
//! | `iat` | 発行時刻（UNIX 秒） |
//! | `exp` | 有効期限（UNIX 秒） |

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use todolist_domain::{role::Role, user::User};

use crate::InfraError;

/// JWT のクレーム（検証済みペイロード）
///
/// 認証ミドルウェアが検証後にリクエスト拡張へ格納し、
/// ハンドラはここからユーザー名・ロールを読み取る。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
   /// サブジェクト（ユーザー名）
   pub sub:   String,
   /// メールアドレス
   pub email: String,
   /// ロール名の配列
   pub roles: Vec<String>,
   /// 発行時刻（UNIX 秒）
   pub iat:   i64,
   /// 有効期限（UNIX 秒）
   pub exp:   i64,
}

impl Claims {
   /// 指定したロールを保持しているか判定する
   pub fn has_role(&self, role_name: &str) -> bool {
      self.roles.iter().any(|r| r == role_name)
   }
}

/// JWT の発行・検証サービス
///
/// アプリケーション起動時に一度だけ構築し、`Arc` で共有する。
pub struct JwtService {
   encoding_key:    EncodingKey,
   decoding_key:    DecodingKey,
   expiration_secs: i64,
   validation:      Validation,
}

impl JwtService {
   /// base64 エンコードされたシークレットからサービスを構築する
   ///
   /// # 引数
   ///
   /// - `base64_secret`: base64 エンコードされた署名鍵
   /// - `expiration_secs`: トークンの有効期間（秒）
   ///
   /// # Errors
   ///
   /// シークレットが base64 としてデコードできない場合。
   pub fn from_base64_secret(
      base64_secret: &str,
      expiration_secs: i64,
   ) -> Result<Self, InfraError> {
      use base64::{Engine as _, engine::general_purpose::STANDARD};

      let secret = STANDARD
         .decode(base64_secret)
         .map_err(|e| InfraError::unexpected(format!("JWT_SECRET が base64 ではありません: {e}")))?;

      let mut validation = Validation::new(Algorithm::HS256);
      // 期限切れ判定に猶予を与えない（デフォルトは 60 秒）
      validation.leeway = 0;

      Ok(Self {
         encoding_key: EncodingKey::from_secret(&secret),
         decoding_key: DecodingKey::from_secret(&secret),
         expiration_secs,
         validation,
      })
   }

   /// トークンの有効期間（秒）を取得する
   pub fn expiration_secs(&self) -> i64 {
      self.expiration_secs
   }

   /// ユーザーとロールからトークンを発行する
   ///
   /// `now` を発行時刻（`iat`）とし、有効期限は `now + expiration_secs`。
   ///
   /// # Errors
   ///
   /// 署名の計算に失敗した場合（`InfraErrorKind::Token`）。
   pub fn issue(
      &self,
      user: &User,
      roles: &[Role],
      now: DateTime<Utc>,
   ) -> Result<String, InfraError> {
      let iat = now.timestamp();
      let claims = Claims {
         sub: user.username().as_str().to_string(),
         email: user.email().as_str().to_string(),
         roles: roles.iter().map(|r| r.name().as_str().to_string()).collect(),
         iat,
         exp: iat + self.expiration_secs,
      };

      let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
      Ok(token)
   }

   /// トークンを検証し、クレームを取り出す
   ///
   /// 署名不一致・期限切れ・形式不正はすべて `jsonwebtoken::errors::Error` として
   /// 返す。API 層はこれを認証エラー（401）にマッピングする。
   pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
      let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
      Ok(data.claims)
   }
}

/// 検証エラーが有効期限切れによるものかを判定する
///
/// API 層が `jsonwebtoken` のエラー型へ直接依存せずに、
/// 期限切れとそれ以外の検証失敗（署名不一致・形式不正）を区別するための述語。
pub fn is_expired(error: &jsonwebtoken::errors::Error) -> bool {
   matches!(
      error.kind(),
      jsonwebtoken::errors::ErrorKind::ExpiredSignature
   )
}

#[cfg(test)]
mod tests {
   use chrono::Duration;
   use jsonwebtoken::errors::ErrorKind;
   use pretty_assertions::assert_eq;
   use rstest::{fixture, rstest};
   use todolist_domain::{
      password::PasswordHash,
      role::{Role, RoleId, RoleName},
      user::{Email, User, UserId, Username},
   };

   use super::*;

   // テスト用シークレット（"test-secret-key-for-unit-tests" の base64）
   const TEST_SECRET: &str = "dGVzdC1zZWNyZXQta2V5LWZvci11bml0LXRlc3Rz";

   #[fixture]
   fn now() -> DateTime<Utc> {
      Utc::now()
   }

   #[fixture]
   fn user(now: DateTime<Utc>) -> User {
      User::new(
         UserId::new(),
         Username::new("yamada").unwrap(),
         Email::new("yamada@example.com").unwrap(),
         PasswordHash::new("$argon2id$v=19$..."),
         now,
      )
   }

   #[fixture]
   fn roles(now: DateTime<Utc>) -> Vec<Role> {
      vec![
         Role::new(
            RoleId::new(),
            RoleName::new("ROLE_USER").unwrap(),
            None,
            now,
         ),
         Role::new(
            RoleId::new(),
            RoleName::new("ROLE_ADMIN").unwrap(),
            None,
            now,
         ),
      ]
   }

   fn service(expiration_secs: i64) -> JwtService {
      JwtService::from_base64_secret(TEST_SECRET, expiration_secs).unwrap()
   }

   #[rstest]
   fn test_発行したトークンを検証できる(user: User, roles: Vec<Role>, now: DateTime<Utc>) {
      let sut = service(3600);

      let token = sut.issue(&user, &roles, now).unwrap();
      let claims = sut.verify(&token).unwrap();

      assert_eq!(claims.sub, "yamada");
      assert_eq!(claims.email, "yamada@example.com");
      assert_eq!(claims.roles, ["ROLE_USER", "ROLE_ADMIN"]);
      assert_eq!(claims.iat, now.timestamp());
      assert_eq!(claims.exp, now.timestamp() + 3600);
   }

   #[rstest]
   fn test_期限切れトークンは無効(user: User, roles: Vec<Role>, now: DateTime<Utc>) {
      let sut = service(3600);

      // 有効期限が過去になるよう発行時刻をずらす
      let issued_at = now - Duration::seconds(3601);
      let token = sut.issue(&user, &roles, issued_at).unwrap();

      let err = sut.verify(&token).unwrap_err();
      assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
   }

   #[rstest]
   fn test_有効期限は1秒過ぎると無効(user: User, roles: Vec<Role>, now: DateTime<Utc>) {
      // 無効になるのは exp < 現在時刻 から。exp ちょうどの秒はまだ有効なため、
      // 境界は exp = now - 1 で検証する
      let sut = service(0);

      let issued_at = now - Duration::seconds(1);
      let token = sut.issue(&user, &roles, issued_at).unwrap();

      let err = sut.verify(&token).unwrap_err();
      assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
   }

   #[rstest]
   fn test_is_expiredは期限切れのみ真(user: User, roles: Vec<Role>, now: DateTime<Utc>) {
      let sut = service(3600);

      let expired = {
         let token = sut.issue(&user, &roles, now - Duration::seconds(3601)).unwrap();
         sut.verify(&token).unwrap_err()
      };
      let garbled = sut.verify("not-a-jwt").unwrap_err();

      assert!(is_expired(&expired));
      assert!(!is_expired(&garbled));
   }

   #[rstest]
   fn test_異なるシークレットで署名されたトークンは無効(
      user: User,
      roles: Vec<Role>,
      now: DateTime<Utc>,
   ) {
      let issuer = service(3600);
      // "another-secret-key-for-unit-tests" の base64
      let verifier =
         JwtService::from_base64_secret("YW5vdGhlci1zZWNyZXQta2V5LWZvci11bml0LXRlc3Rz", 3600)
            .unwrap();

      let token = issuer.issue(&user, &roles, now).unwrap();

      let err = verifier.verify(&token).unwrap_err();
      assert!(matches!(err.kind(), ErrorKind::InvalidSignature));
   }

   #[rstest]
   fn test_改ざんされたトークンは無効(user: User, roles: Vec<Role>, now: DateTime<Utc>) {
      let sut = service(3600);

      let token = sut.issue(&user, &roles, now).unwrap();
      let tampered = format!("{token}x");

      assert!(sut.verify(&tampered).is_err());
   }

   #[test]
   fn test_base64でないシークレットはエラー() {
      let result = JwtService::from_base64_secret("not-base64!!!", 3600);
      assert!(result.is_err());
   }

   #[rstest]
   #[case(&["ROLE_USER"], "ROLE_USER", true)]
   #[case(&["ROLE_USER"], "ROLE_ADMIN", false)]
   #[case(&["ROLE_USER", "ROLE_ADMIN"], "ROLE_ADMIN", true)]
   #[case(&[], "ROLE_USER", false)]
   fn test_has_roleによるロール判定(
      #[case] roles: &[&str],
      #[case] required: &str,
      #[case] expected: bool,
   ) {
      let claims = Claims {
         sub:   "yamada".to_string(),
         email: "yamada@example.com".to_string(),
         roles: roles.iter().map(|r| r.to_string()).collect(),
         iat:   0,
         exp:   i64::MAX,
      };

      assert_eq!(claims.has_role(required), expected);
   }
}
