pub mod ddl;
pub mod recordings;
