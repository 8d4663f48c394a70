/*!
 * Authentication context extractor
 *
 * Responsibility:
 * - 認証済みリクエストのコンテキスト (AuthenticatedContext) を handler に提供する
 * - 型そのものは domain 側 (middleware / services と共有)
 */

mod core;

pub use core::CurrentUser;
