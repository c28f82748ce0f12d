pub mod table;

pub use table::UserTable;
