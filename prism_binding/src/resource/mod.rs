mod resource_state;
mod buffer;
mod texture;
mod sampler;
mod device_object;

pub use resource_state::{ResourceId, ResourceState, BindFlags, Usage};
pub(crate) use resource_state::StateCell;
pub use buffer::{Buffer, BufferDesc, BufferView, BufferViewType};
pub use texture::{Texture, TextureDesc, TextureView, TextureViewType};
pub use sampler::{Sampler, SamplerDesc, FilterType, AddressMode, ComparisonFunc};
pub use device_object::DeviceObject;
