mod builder;
mod expr;
mod state;

pub use {builder::*, expr::*, state::*};
