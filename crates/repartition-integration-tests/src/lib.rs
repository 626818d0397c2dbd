//! Integration test crate for the distribution engine.
//!
//! No library code: the tests under `tests/` run complete distributions
//! through the engine, the SQLite rule store and the history.
//!
//! ```sh
//! cargo test -p repartition-integration-tests
//! ```
