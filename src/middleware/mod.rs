/*
 * Responsibility
 * - middlware の公開インターフェース
 * - auth (認証 stage / role gate), http, cors, security headers
 */
pub mod auth;
pub mod cors;
pub mod http;
pub mod security_headers;
