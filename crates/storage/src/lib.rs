// SPDX-License-Identifier: MIT

//! A reference persistence layer: an event-sourced `MaterializedState` fed
//! by an append-only write-ahead log of [`cylc_core::Event`]s.
//!
//! This is the concrete shape spec.md §1 leaves as an external
//! collaborator ("a key/value + relational store supporting upsert of
//! task/job rows and retrieval of platform sets"). A real deployment could
//! swap this crate's [`wal::Wal`] for sqlite without touching the engine,
//! since the engine only ever talks to [`state::MaterializedState`] through
//! [`state::apply`].

pub mod errors;
pub mod state;
pub mod wal;

pub use errors::StorageError;
pub use state::{apply, MaterializedState, TaskRecord};
pub use wal::Wal;
