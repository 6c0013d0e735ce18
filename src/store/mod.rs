// file: src/store/mod.rs
// description: vector index, docstore and chunk map persistence
// reference: module organization

pub mod chunk_map;
pub mod codec;
pub mod flat;
pub mod vector_store;

pub use chunk_map::{CHUNK_MAP_FILE, ChunkMap};
pub use codec::{DOCSTORE_FILE, INDEX_FILE, MAPPING_FILE};
pub use flat::FlatIndex;
pub use vector_store::{DocStore, IndexMapping, VectorStore};
