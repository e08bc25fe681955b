//! Foreign-key and check constraint fragments

mod builder;


pub use builder::*;
