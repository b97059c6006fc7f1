pub mod retry;
pub mod table;
