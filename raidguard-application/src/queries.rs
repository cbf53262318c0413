pub mod snapshot_queries;
