use crate::math::Mat4;

use super::frame::{ColourMatrix, ColourMetadata, ColourRange};

/// YUV → RGB conversion state for one video stream.
///
/// Picture controls are user settings; matrix and range follow the frames.
/// `matrix()` is uploaded as the parameters uniform of the video programs,
/// which compute `rgb = params × vec4(y, u, v, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoColourSpace {
    pub colour_matrix: ColourMatrix,
    pub range: ColourRange,
    /// Added to every channel, `-1.0..=1.0`.
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    /// Chroma rotation in degrees.
    pub hue: f32,
    changed: bool,
}

impl Default for VideoColourSpace {
    fn default() -> Self {
        Self {
            colour_matrix: ColourMatrix::default(),
            range: ColourRange::default(),
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            hue: 0.0,
            changed: true,
        }
    }
}

/// Linear form `y·Y + u·U + v·V + c`.
#[derive(Debug, Copy, Clone, Default)]
struct Lin {
    y: f32,
    u: f32,
    v: f32,
    c: f32,
}

impl Lin {
    fn add(self, o: Lin, k: f32) -> Lin {
        Lin {
            y: self.y + o.y * k,
            u: self.u + o.u * k,
            v: self.v + o.v * k,
            c: self.c + o.c * k,
        }
    }

    fn scaled(self, k: f32, offset: f32) -> Lin {
        Lin { y: self.y * k, u: self.u * k, v: self.v * k, c: self.c * k + offset }
    }
}

impl VideoColourSpace {
    /// Follows the frame's colour description. Returns true when the matrix
    /// needs re-uploading.
    pub fn update_from_frame(&mut self, colour: &ColourMetadata) -> bool {
        if colour.matrix != self.colour_matrix || colour.range != self.range {
            log::debug!("video colourspace now {:?} {:?}", colour.matrix, colour.range);
            self.colour_matrix = colour.matrix;
            self.range = colour.range;
            self.changed = true;
        }
        self.changed
    }

    pub fn set_picture(&mut self, brightness: f32, contrast: f32, saturation: f32, hue: f32) {
        self.brightness = brightness.clamp(-1.0, 1.0);
        self.contrast = contrast.max(0.0);
        self.saturation = saturation.max(0.0);
        self.hue = hue;
        self.changed = true;
    }

    /// Clears the change flag once the matrix has been uploaded.
    pub fn mark_uploaded(&mut self) {
        self.changed = false;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Luma weights `(kr, kb)` of the colour matrix.
    fn coefficients(&self) -> (f32, f32) {
        match self.colour_matrix {
            ColourMatrix::Bt601 => (0.299, 0.114),
            ColourMatrix::Bt709 => (0.2126, 0.0722),
            ColourMatrix::Bt2020 => (0.2627, 0.0593),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        let (kr, kb) = self.coefficients();
        let kg = 1.0 - kr - kb;

        let (luma_scale, luma_offset, chroma_scale) = match self.range {
            ColourRange::Limited => (255.0 / 219.0, 16.0 / 255.0, 255.0 / 224.0),
            ColourRange::Full => (1.0, 0.0, 1.0),
        };

        let y = Lin { y: luma_scale, c: -luma_scale * luma_offset, ..Lin::default() };

        // Centred chroma, then saturation and hue as a scaled rotation.
        let cu = Lin { u: chroma_scale, c: -0.5 * chroma_scale, ..Lin::default() };
        let cv = Lin { v: chroma_scale, c: -0.5 * chroma_scale, ..Lin::default() };
        let (sin, cos) = self.hue.to_radians().sin_cos();
        let s = self.saturation;
        let u = Lin::default().add(cu, s * cos).add(cv, -s * sin);
        let v = Lin::default().add(cu, s * sin).add(cv, s * cos);

        let r = y.add(v, 2.0 * (1.0 - kr));
        let g = y
            .add(u, -2.0 * kb * (1.0 - kb) / kg)
            .add(v, -2.0 * kr * (1.0 - kr) / kg);
        let b = y.add(u, 2.0 * (1.0 - kb));

        let [r, g, b] = [r, g, b].map(|l| l.scaled(self.contrast, self.brightness));

        Mat4::from_cols([
            [r.y, g.y, b.y, 0.0],
            [r.u, g.u, b.u, 0.0],
            [r.v, g.v, b.v, 0.0],
            [r.c, g.c, b.c, 1.0],
        ])
    }
}
