pub mod artifact;
pub mod backend;
pub mod channel;
pub mod error;
pub mod image;
pub mod layout;
pub mod mapper;
pub mod nchw;
pub mod normalize;
pub mod spec;
pub mod tensor;

pub use artifact::*;
pub use backend::*;
pub use channel::*;
pub use error::*;
pub use image::*;
pub use layout::*;
pub use mapper::*;
pub use nchw::*;
pub use normalize::*;
pub use spec::*;
pub use tensor::*;
