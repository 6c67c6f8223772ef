//! moneylens-intake: statement file intake (CSV gate, text read, row count).

pub mod statement;

pub use statement::{LoadedStatement, accept, is_csv_path, transaction_rows};
