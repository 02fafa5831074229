//! # HTTP ミドルウェア
//!
//! ルーターに適用する横断的関心事（認証・認可）を提供する。

pub mod auth;
