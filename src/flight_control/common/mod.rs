pub(crate) mod ring_log;
pub(crate) mod vec3d;
