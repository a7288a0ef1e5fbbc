mod stage;
mod resources;
mod shader;

pub use stage::{ShaderStage, ShaderStageFlags};
pub use resources::{ShaderResourceKind, ShaderResourceAttribs, ShaderResources};
pub use shader::{Shader, ShaderDesc};
