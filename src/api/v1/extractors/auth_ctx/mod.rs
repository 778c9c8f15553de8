/*!
 * Authenticated principal extractor
 *
 * Responsibility:
 * - 認証 stage が extensions に入れた Principal を handler に渡す
 * - handler は body / query の id を identity として扱わない。identity はこの extractor だけ
 *
 * Public API:
 * - CurrentPrincipal
 */

mod core;

pub use core::CurrentPrincipal;
