//! End-to-end and adversarial test suite for Arbibots.
//!
//! Integration tests drive the full stack through the single-writer
//! [`arbi_node_lib::Applier`] and check the collection's accounting
//! invariants under scripted and randomized operation sequences.

pub mod helpers;
