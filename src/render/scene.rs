use std::sync::Arc;

use vello_cpu::kurbo::{BezPath, Circle, Ellipse, Rect, RoundedRect, Shape};

use crate::animation::clock::AnimationState;
use crate::foundation::core::{Canvas, Rgba8Premul};
use crate::foundation::error::{PresenterError, PresenterResult};
use crate::foundation::math::{clamp01, lerp};
use crate::render::surface::FrameRGBA;
use crate::render::text::{SceneFont, TextBlock, TextBrushRgba8, TextLayoutEngine, draw_text};

/// Mouth height when closed, in pixels.
pub const MOUTH_CLOSED_PX: f64 = 2.0;
/// Mouth height when fully open, in pixels.
pub const MOUTH_OPEN_PX: f64 = 16.0;

const BG_TOP: [u8; 3] = [0xec, 0xfe, 0xff];
const BG_BOTTOM: [u8; 3] = [0xff, 0xff, 0xff];
const TITLE_COLOR: TextBrushRgba8 = TextBrushRgba8::new(0x0f, 0x17, 0x2a, 0xff);
const TAGLINE_COLOR: TextBrushRgba8 = TextBrushRgba8::new(0x33, 0x41, 0x55, 0xff);
const SUBTITLE_COLOR: TextBrushRgba8 = TextBrushRgba8::new(0xff, 0xff, 0xff, 0xff);

/// Shoulder fill.
pub const SHOULDERS: Rgba8Premul = Rgba8Premul::opaque(0x0e, 0xa5, 0xe9);
/// Neck fill.
pub const NECK: Rgba8Premul = Rgba8Premul::opaque(0xf2, 0xc7, 0xa5);
/// Head fill.
pub const HEAD: Rgba8Premul = Rgba8Premul::opaque(0xf7, 0xd3, 0xb6);
/// Hair fill.
pub const HAIR: Rgba8Premul = Rgba8Premul::opaque(0x1f, 0x29, 0x37);
/// Eye fill.
pub const EYES: Rgba8Premul = Rgba8Premul::opaque(0x11, 0x18, 0x27);
/// Mouth fill.
pub const MOUTH: Rgba8Premul = Rgba8Premul::opaque(0xb9, 0x1c, 0x1c);
const SUBTITLE_BOX: [u8; 4] = [15, 23, 42, 204];

/// Geometry of the presenter figure and the subtitle bar for one canvas size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AvatarLayout {
    /// Horizontal center of the head.
    pub center_x: f64,
    /// Vertical center of the head.
    pub center_y: f64,
    /// Head radius.
    pub head_radius: f64,
    /// Subtitle box bounds.
    pub subtitle_box: Rect,
}

impl AvatarLayout {
    /// Geometry for `canvas`.
    pub fn new(canvas: Canvas) -> Self {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let size = w.min(h) * 0.5;
        let box_w = w * 0.9;
        let box_x = (w - box_w) / 2.0;
        let box_y = h - 90.0;
        Self {
            center_x: w * 0.55,
            center_y: h * 0.52,
            head_radius: size * 0.23,
            subtitle_box: Rect::new(box_x, box_y, box_x + box_w, box_y + 54.0),
        }
    }

    /// Mouth height for `openness`, linear between closed and fully open.
    pub fn mouth_height(openness: f32) -> f64 {
        lerp(MOUTH_CLOSED_PX, MOUTH_OPEN_PX, f64::from(clamp01(openness)))
    }

    /// Mouth rectangle, centered 22 px below the head center.
    pub fn mouth_rect(&self, openness: f32) -> Rect {
        let h = Self::mouth_height(openness);
        let top = self.center_y + 22.0 - h / 2.0;
        Rect::new(
            self.center_x - 18.0,
            top,
            self.center_x + 18.0,
            top + h,
        )
    }

    fn shoulders(&self) -> Ellipse {
        let r = self.head_radius;
        Ellipse::new(
            (self.center_x, self.center_y + r + 40.0),
            (r * 1.8, r * 0.9),
            0.0,
        )
    }

    fn neck(&self) -> RoundedRect {
        rounded(
            Rect::new(
                self.center_x - 22.0,
                self.center_y + self.head_radius - 10.0,
                self.center_x + 22.0,
                self.center_y + self.head_radius + 26.0,
            ),
            10.0,
        )
    }

    fn head(&self) -> Circle {
        Circle::new((self.center_x, self.center_y), self.head_radius)
    }

    fn hair(&self) -> BezPath {
        let (x, y, r) = (self.center_x, self.center_y, self.head_radius);
        let mut p = BezPath::new();
        p.move_to((x - r, y - r * 0.1));
        p.curve_to(
            (x - r * 0.8, y - r * 0.9),
            (x + r * 0.8, y - r * 0.9),
            (x + r, y - r * 0.1),
        );
        p.curve_to(
            (x + r * 1.05, y + r * 0.8),
            (x - r * 1.05, y + r * 0.8),
            (x - r, y - r * 0.1),
        );
        p.close_path();
        p
    }

    fn eyes(&self) -> [Circle; 2] {
        let dx = self.head_radius * 0.25;
        let y = self.center_y - self.head_radius * 0.1;
        [
            Circle::new((self.center_x - dx, y), 6.0),
            Circle::new((self.center_x + dx, y), 6.0),
        ]
    }
}

/// Round a rectangle, clamping the radius so it never exceeds half the shorter side.
fn rounded(rect: Rect, radius: f64) -> RoundedRect {
    let max = (rect.width().min(rect.height()) / 2.0).max(0.0);
    RoundedRect::from_rect(rect, radius.min(max))
}

/// Paints the presenter scene for one [`AnimationState`].
///
/// Owns only caches (background image, fixed text layouts, last subtitle); it never mutates the
/// state it is given.
pub struct SceneRenderer {
    canvas: Canvas,
    dims: (u16, u16),
    layout: AvatarLayout,
    background: vello_cpu::Image,
    text: Option<SceneText>,
}

struct SceneText {
    font: SceneFont,
    title: TextBlock,
    tagline: TextBlock,
    subtitle_px: f32,
    subtitle: Option<TextBlock>,
}

impl SceneRenderer {
    /// Prepare a renderer. Without `font` no text is painted; the subtitle box still is.
    pub fn new(
        canvas: Canvas,
        title: &str,
        tagline: &str,
        font: Option<Vec<u8>>,
    ) -> PresenterResult<Self> {
        canvas.validate()?;
        let dims = canvas.dims_u16()?;
        let background = gradient_image(dims.0, dims.1)?;

        let text = match font {
            Some(bytes) => {
                let font = SceneFont::new(bytes)?;
                let w = canvas.width as f32;
                let mut engine = TextLayoutEngine::new();
                let title = engine.layout_line(&font, title, (w * 0.035).round(), TITLE_COLOR)?;
                let tagline =
                    engine.layout_line(&font, tagline, (w * 0.018).round(), TAGLINE_COLOR)?;
                Some(SceneText {
                    font,
                    title,
                    tagline,
                    subtitle_px: (w * 0.022).round(),
                    subtitle: None,
                })
            }
            None => None,
        };

        Ok(Self {
            canvas,
            dims,
            layout: AvatarLayout::new(canvas),
            background,
            text,
        })
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Geometry used for painting.
    pub fn layout(&self) -> &AvatarLayout {
        &self.layout
    }

    /// Whether text is painted.
    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    /// Paint a full frame.
    pub fn render(&mut self, state: &AnimationState) -> PresenterResult<FrameRGBA> {
        let (w, h) = self.dims;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let full = Rect::new(0.0, 0.0, f64::from(w), f64::from(h));

        ctx.set_paint(self.background.clone());
        ctx.fill_rect(&full);

        if let Some(text) = self.text.as_ref() {
            draw_text(&mut ctx, &text.font, &text.title, 32.0, 56.0);
            draw_text(&mut ctx, &text.font, &text.tagline, 32.0, 86.0);
        }

        let l = self.layout;
        fill(&mut ctx, &l.shoulders(), SHOULDERS);
        fill(&mut ctx, &l.neck(), NECK);
        fill(&mut ctx, &l.head(), HEAD);
        fill(&mut ctx, &l.hair(), HAIR);
        for eye in l.eyes() {
            fill(&mut ctx, &eye, EYES);
        }
        fill(&mut ctx, &rounded(l.mouth_rect(state.mouth_openness), 8.0), MOUTH);

        let [r, g, b, a] = SUBTITLE_BOX;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.fill_path(&rounded(l.subtitle_box, 12.0).to_path(0.1));

        let subtitle = state.subtitle_text();
        if let Some(text) = self.text.as_mut() {
            let stale = text.subtitle.as_ref().is_none_or(|b| b.text != subtitle);
            if stale {
                let mut engine = TextLayoutEngine::new();
                text.subtitle = Some(engine.layout_line(
                    &text.font,
                    subtitle,
                    text.subtitle_px,
                    SUBTITLE_COLOR,
                )?);
            }
            if let Some(block) = text.subtitle.as_ref() {
                let x = f64::from(w) / 2.0 - f64::from(block.width()) / 2.0;
                draw_text(&mut ctx, &text.font, block, x, l.subtitle_box.y0 + 36.0);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);

        let data = pixmap.data_as_u8_slice().to_vec();
        if data.len() != self.canvas.rgba_len() {
            return Err(PresenterError::render("pixmap size mismatch"));
        }
        Ok(FrameRGBA {
            width: self.canvas.width,
            height: self.canvas.height,
            data,
            premultiplied: true,
        })
    }
}

fn fill(ctx: &mut vello_cpu::RenderContext, shape: &impl Shape, color: Rgba8Premul) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&shape.to_path(0.1));
}

/// Vertical background gradient as an opaque image paint.
fn gradient_image(w: u16, h: u16) -> PresenterResult<vello_cpu::Image> {
    if w == 0 || h == 0 {
        return Err(PresenterError::validation("gradient size must be non-zero"));
    }
    let mut pixels = Vec::with_capacity(usize::from(w) * usize::from(h));
    let denom = f64::from(h.saturating_sub(1).max(1));
    for y in 0..h {
        let t = f64::from(y) / denom;
        let c = |i: usize| lerp(f64::from(BG_TOP[i]), f64::from(BG_BOTTOM[i]), t).round() as u8;
        let px = vello_cpu::peniko::color::PremulRgba8 {
            r: c(0),
            g: c(1),
            b: c(2),
            a: 255,
        };
        pixels.extend(std::iter::repeat_n(px, usize::from(w)));
    }
    let pixmap = vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, false);
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
