//! Vector side of the tutor: the flat inner-product index plus the LanceDB
//! artifact that stores chunk text and embeddings between the offline build
//! and serving.
pub mod flat;
pub mod loader;
pub mod schema;
pub mod table;
pub mod writer;

pub use flat::FlatIpIndex;
pub use loader::{load_artifacts, LoadedArtifacts};
pub use writer::ArtifactWriter;
