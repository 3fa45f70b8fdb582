//! Black-box integration tests for the `lexlr` facade, living in this
//! crate's `tests/` directory rather than `#[cfg(test)]` modules — the
//! per-module unit tests stay alongside their own crates; this crate drives
//! the public API end to end.
