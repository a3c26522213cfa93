//! End-to-end tests over the public API and the binary.

mod cli_run;
mod generation;
mod pipeline;
