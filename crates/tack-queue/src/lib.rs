//! HTTP collaborators of the tack worker: the claim queue client and the artifact publisher.

mod config;
pub use config::QueueConfig;

mod errors;
pub use errors::QueueError;

mod routes;
pub use routes::Routes;

mod client;
pub use client::HttpQueue;

mod publish;
pub use publish::HttpPublisher;
