pub mod feed;
pub mod fixture_feed;
pub mod http_client;
pub mod improvements;
pub mod records_fetch;
pub mod snapshot;
pub mod state;
pub mod trpc;
