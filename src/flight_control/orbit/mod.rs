mod path;
mod planet;

pub use path::OrbitPath;
pub use planet::Planet;
