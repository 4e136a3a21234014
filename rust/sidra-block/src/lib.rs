//! The columnar block/vector data model of the sidra execution engine.
//!
//! This crate provides the in-memory representation of a single logical
//! column of query results: the foundation every operator in the vectorized
//! execution pipeline (scan, filter, aggregate, project) reads and writes.
//!
//! # Core Concepts
//!
//! ## Blocks
//!
//! A [`block::Block`] represents a column in which each logical position may
//! hold zero (null), one, or many values. Values live in a dense,
//! type-specialized store addressed by *value index*; positions map onto
//! value-index ranges through optional accounting metadata
//! ([`offsets::Offsets`] for first-value indexes, [`null_mask::NullMask`]
//! for nullness) attached to an otherwise plain store. The common
//! single-valued non-null case carries no metadata at all.
//!
//! ## Vectors
//!
//! A [`vector::Vector`] is the dense, null-free, single-valued
//! specialization: position `i` maps directly to value `i`. Operators that
//! know their data is uniform narrow a block with
//! [`block::Block::as_vector`] and skip the per-position metadata entirely.
//! Narrowing is a total operation: data that is not vector-shaped yields
//! `None`, never an error.
//!
//! ## Filter views
//!
//! Selection operators never copy values: [`filter::FilterBlock`] and
//! [`filter::FilterVector`] remap logical positions onto a delegate through
//! an explicit position sequence, sharing the delegate and its store.
//!
//! ## Element types
//!
//! [`element_type::ElementType`] is the closed tag identifying the value
//! kind of every block, vector and view. Pipelines dispatch on it
//! exhaustively at their boundaries; the per-position read path stays on the
//! small `Block`/`Vector` interfaces for composability.
//!
//! # Memory and Concurrency
//!
//! Blocks, vectors and views are immutable after construction and shared via
//! `Arc`: concurrent read-only access needs no locking. Value stores are
//! contiguous buffers with no per-value heap object, shared between an
//! original block and all views derived from it; transformations that change
//! values allocate new stores instead of mutating shared state.
//!
//! # Equality
//!
//! Structural equality and hashing over `dyn Block` are defined on
//! observable content only (see [`block::blocks_equal`]): a base block, a
//! filter composition and a narrowed vector with the same content compare
//! and hash identically, which test suites rely on to assert pipeline
//! output without depending on representation.

pub mod block;
pub mod bytes_block;
pub mod constant;
pub mod element_type;
pub mod filter;
pub mod null_mask;
pub mod offsets;
pub mod primitive_block;
pub mod values;
pub mod vector;
