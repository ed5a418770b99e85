//! Document storage.
//!
//! Collections are typed [`Repository`] trait objects so handlers never see
//! the backing implementation; the server ships with [`MemoryRepository`].

pub mod filter;
pub mod memory;
pub mod repository;

pub use filter::{Clause, Filter, ID, IS_ACTIVE};
pub use memory::MemoryRepository;
pub use repository::{
    Check, Document, DocumentMeta, FindOptions, Mutation, Rejection, Repository, SortOrder,
    StoreError, StoreResult,
};
