pub mod filing;
pub mod parsing;
