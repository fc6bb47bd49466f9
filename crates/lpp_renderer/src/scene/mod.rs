//! Scene content consumed by the renderer

pub mod drawable;

pub use drawable::{BillboardCluster, Drawable, Sky, StaticMesh, TerrainTile, Water, LIGHT_BUFFER_SLOT};
