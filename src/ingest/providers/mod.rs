pub mod fixture;
pub mod graphql;

pub use fixture::FixtureProductSource;
pub use graphql::HttpProductSource;
