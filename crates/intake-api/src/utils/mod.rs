pub mod body;
pub mod precondition;
