pub mod activity;
pub mod sleep;
