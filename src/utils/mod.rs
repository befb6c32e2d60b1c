pub mod data;
pub mod ledger;
pub mod lines;
pub mod lock_window;
pub mod odds;
pub mod stats;
pub mod validator;
