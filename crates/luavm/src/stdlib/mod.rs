// Native libraries available to loaded chunks

pub mod basic;
