pub mod error;
#[cfg(test)]
pub mod memory;
pub mod user_repo;
