pub mod client;

pub use client::{bootstrap, Client};
