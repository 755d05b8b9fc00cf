mod cast;
mod collection;
mod entity;
mod schema;

pub use {cast::*, collection::*, entity::*, schema::*};
