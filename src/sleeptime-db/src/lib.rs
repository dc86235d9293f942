#[macro_use]
extern crate log;

mod db;
pub use db::DatabaseHandler;

mod sync;
mod type_impl;

pub use type_impl::activity::SearchActivity;
