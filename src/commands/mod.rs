pub mod summarize;
pub mod weekly;
