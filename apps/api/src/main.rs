//! # Todolist API サーバー
//!
//! TODO 管理・ユーザー管理・認証を提供する REST API サーバー。
//!
//! ## エンドポイント
//!
//! | メソッド | パス | 認証 | 説明 |
//! |---------|------|------|------|
//! | POST | `/api/auth/login` | 不要 | ログイン |
//! | POST | `/api/auth/register` | 不要 | ユーザー登録 |
//! | GET | `/api/auth/me` | 必要 | 現在ユーザーの取得 |
//! | GET/POST | `/api/todos` | 必要 | TODO の一覧・作成 |
//! | GET/PUT/DELETE | `/api/todos/{id}` | 必要 | TODO の取得・更新・削除 |
//! | GET/POST | `/api/users` | 管理者 | ユーザーの一覧・作成 |
//! | GET/DELETE | `/api/users/{id}` | 管理者 | ユーザーの取得・削除 |
//! | PUT | `/api/users/{id}/roles` | 管理者 | ロール割り当ての差し替え |
//! | GET | `/api/health` | 不要 | ヘルスチェック |
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `JWT_SECRET` | **Yes** | トークン署名鍵（base64 エンコード） |
//! | `JWT_EXPIRATION` | No | トークン有効期間・秒（デフォルト: 86400） |
//!
//! ## 起動方法
//!
//! ```bash
//! API_PORT=8080 DATABASE_URL=postgres://... JWT_SECRET=... cargo run -p todolist-api
//! ```

mod config;
mod error;
mod handler;
mod middleware;
mod usecase;

use std::{net::SocketAddr, sync::Arc};

use axum::{
   Router,
   middleware::{from_fn, from_fn_with_state},
   routing::{get, post, put},
};
use config::ApiConfig;
use handler::{
   AuthHandlerState,
   HealthState,
   TodoState,
   UserState,
   create_todo,
   create_user,
   delete_todo,
   delete_user,
   get_todo,
   get_user,
   health_check,
   list_todos,
   list_users,
   login,
   me,
   register,
   update_todo,
   update_user_roles,
};
use middleware::auth::{AuthState, authenticate, require_admin};
use todolist_domain::clock::{Clock, SystemClock};
use todolist_infra::{
   Argon2PasswordChecker,
   Argon2PasswordHasher,
   JwtService,
   PasswordChecker,
   PasswordHasher,
   db,
   repository::{
      PostgresRoleRepository,
      PostgresTodoRepository,
      PostgresUserRepository,
      RoleRepository,
      TodoRepository,
      UserRepository,
   },
};
use todolist_shared::{
   canonical_log::CanonicalLogLineLayer,
   observability::{TracingConfig, make_request_span},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use usecase::{AuthUseCaseImpl, TodoUseCaseImpl, UserUseCaseImpl};

/// API サーバーのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
   // .env ファイルを読み込む（存在する場合）
   dotenvy::dotenv().ok();

   // トレーシング初期化
   let tracing_config = TracingConfig::from_env("api");
   todolist_shared::observability::init_tracing(tracing_config);
   let _tracing_guard = tracing::info_span!("app", service = "api").entered();

   // 設定読み込み
   let config = ApiConfig::from_env().expect("設定の読み込みに失敗しました");

   tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

   // データベース接続プールを作成
   let pool = db::create_pool(&config.database_url)
      .await
      .expect("データベース接続に失敗しました");
   tracing::info!("データベースに接続しました");

   // マイグレーション実行
   db::run_migrations(&pool)
      .await
      .expect("マイグレーションの実行に失敗しました");
   tracing::info!("マイグレーションを適用しました");

   // JWT サービス（認証ミドルウェアとトークン発行で共有）
   let jwt = Arc::new(
      JwtService::from_base64_secret(&config.jwt_secret, config.jwt_expiration_secs)
         .expect("JWT_SECRET の読み込みに失敗しました"),
   );

   // ヘルスチェック用 State（pool が move される前に clone）
   let health_state = HealthState { pool: pool.clone() };

   // 依存コンポーネントを初期化
   let todo_repo: Arc<dyn TodoRepository> = Arc::new(PostgresTodoRepository::new(pool.clone()));
   let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
   let role_repo: Arc<dyn RoleRepository> = Arc::new(PostgresRoleRepository::new(pool));
   let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
   let password_checker: Arc<dyn PasswordChecker> = Arc::new(Argon2PasswordChecker::new());
   let clock: Arc<dyn Clock> = Arc::new(SystemClock);

   let todo_state = Arc::new(TodoState {
      usecase: Arc::new(TodoUseCaseImpl::new(todo_repo, clock.clone())),
   });
   let user_state = Arc::new(UserState {
      usecase: Arc::new(UserUseCaseImpl::new(
         user_repo.clone(),
         role_repo.clone(),
         password_hasher.clone(),
         clock.clone(),
      )),
   });
   let auth_state = Arc::new(AuthHandlerState {
      usecase: Arc::new(AuthUseCaseImpl::new(
         user_repo,
         role_repo,
         password_hasher,
         password_checker,
         jwt.clone(),
         clock,
      )),
   });

   // ルーター構築
   //
   // - `/api/users` 配下は route_layer で管理者ロールを要求
   // - authenticate は /api 全体に適用し、公開パスのみ素通しする
   // - render_error_body はハンドラのエラーをパス付き JSON に確定する
   let todo_router = Router::new()
      .route("/api/todos", get(list_todos).post(create_todo))
      .route(
         "/api/todos/{id}",
         get(get_todo).put(update_todo).delete(delete_todo),
      )
      .with_state(todo_state);

   let user_router = Router::new()
      .route("/api/users", get(list_users).post(create_user))
      .route("/api/users/{id}", get(get_user).delete(delete_user))
      .route("/api/users/{id}/roles", put(update_user_roles))
      .route_layer(from_fn(require_admin))
      .with_state(user_state);

   let auth_router = Router::new()
      .route("/api/auth/login", post(login))
      .route("/api/auth/register", post(register))
      .route("/api/auth/me", get(me))
      .with_state(auth_state);

   let health_router = Router::new()
      .route("/api/health", get(health_check))
      .with_state(health_state);

   let app = Router::new()
      .merge(todo_router)
      .merge(user_router)
      .merge(auth_router)
      .merge(health_router)
      .layer(from_fn_with_state(AuthState { jwt }, authenticate))
      .layer(from_fn(error::render_error_body))
      .layer(CanonicalLogLineLayer)
      .layer(TraceLayer::new_for_http().make_span_with(make_request_span));

   let addr: SocketAddr = format!("{}:{}", config.host, config.port)
      .parse()
      .expect("アドレスのパースに失敗しました");

   let listener = TcpListener::bind(addr).await?;
   tracing::info!("API サーバーが起動しました: {}", addr);

   axum::serve(listener, app).await?;

   Ok(())
}
