use super::backend::RawProgram;

/// Vertex stage shared by every built-in program (`vs_main`).
pub const VERTEX_SHADER: &str = include_str!("shaders/vertex.wgsl");

/// Built-in programs compiled at `init()`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DefaultShader {
    /// Flat colour fill.
    Simple,
    /// Textured blit with colour multiplier.
    Default,
    /// Antialiased filled disc.
    Circle,
    /// Antialiased ring.
    CircleEdge,
    /// Antialiased vertical line.
    VertLine,
    /// Antialiased horizontal line.
    HorizLine,
}

impl DefaultShader {
    pub const ALL: [DefaultShader; 6] = [
        DefaultShader::Simple,
        DefaultShader::Default,
        DefaultShader::Circle,
        DefaultShader::CircleEdge,
        DefaultShader::VertLine,
        DefaultShader::HorizLine,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DefaultShader::Simple => "simple",
            DefaultShader::Default => "default",
            DefaultShader::Circle => "circle",
            DefaultShader::CircleEdge => "circle-edge",
            DefaultShader::VertLine => "vert-line",
            DefaultShader::HorizLine => "horiz-line",
        }
    }

    /// Fragment stage source (`fs_main`).
    pub fn fragment_source(self) -> &'static str {
        match self {
            DefaultShader::Simple => include_str!("shaders/simple.wgsl"),
            DefaultShader::Default => include_str!("shaders/default.wgsl"),
            DefaultShader::Circle => include_str!("shaders/circle.wgsl"),
            DefaultShader::CircleEdge => include_str!("shaders/circle_edge.wgsl"),
            DefaultShader::VertLine => include_str!("shaders/vert_line.wgsl"),
            DefaultShader::HorizLine => include_str!("shaders/horiz_line.wgsl"),
        }
    }
}

/// Engine-side program record.
#[derive(Debug)]
pub struct ShaderProgram {
    pub(crate) raw: RawProgram,
    pub(crate) builtin: Option<DefaultShader>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_has_a_fragment_entry_point() {
        assert!(VERTEX_SHADER.contains("fn vs_main"));
        for shader in DefaultShader::ALL {
            assert!(shader.fragment_source().contains("fn fs_main"), "{}", shader.name());
        }
    }
}
