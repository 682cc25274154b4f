//! Raw reconstruction tables: the dense grid velocity table and the
//! sparse boundary velocity field.

pub mod inside;
pub mod outside;
