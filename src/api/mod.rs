mod client;
mod source;
mod worker;

pub use client::Api;
pub use source::{DataSource, DirSource, Endpoint, HttpSource};
pub use worker::{Request, Response, Worker};

#[cfg(test)]
pub use worker::handle;
