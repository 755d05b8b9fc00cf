mod client;
mod response;
mod router;

pub use {client::*, response::*, router::*};
