//! Cache infrastructure - response cache implementations

mod in_memory;

pub use in_memory::InMemoryResponseCache;
