// Test module organization
pub mod chunk_builder;

pub mod test_arith;
pub mod test_compare;
pub mod test_concat;
pub mod test_errors;
pub mod test_loops;
pub mod test_stack;
