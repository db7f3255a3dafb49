pub mod mapper;
pub mod region;

pub use mapper::{
    fit_contain, map_pointer_to_scene, ContainerRect, NormalizedPoint, PointerMapping,
    RenderedArea,
};
pub use region::{BoundingBox, SCENE_SCALE};
