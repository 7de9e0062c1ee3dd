pub mod health;
pub mod retention;
