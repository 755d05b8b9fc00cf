//! Create, update and destroy actions against the remote API.

mod action;
mod persister;

pub use {action::*, persister::*};
