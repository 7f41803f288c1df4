//! Small matrix toolkit used by the transform stack and the shader uniforms.

mod mat4;

pub use mat4::Mat4;
