pub mod align;
pub mod evaluate;
mod input;
