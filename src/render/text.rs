use std::sync::Arc;

use crate::foundation::error::{PresenterError, PresenterResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub(crate) struct TextBrushRgba8 {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl TextBrushRgba8 {
    pub(crate) const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Font shared by every text element of the scene.
#[derive(Clone)]
pub(crate) struct SceneFont {
    bytes: Arc<Vec<u8>>,
    data: vello_cpu::peniko::FontData,
}

impl SceneFont {
    pub(crate) fn new(bytes: Vec<u8>) -> PresenterResult<Self> {
        if bytes.is_empty() {
            return Err(PresenterError::validation("font file is empty"));
        }
        let bytes = Arc::new(bytes);
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(bytes.as_ref().clone()),
            0,
        );
        Ok(Self { bytes, data })
    }

    pub(crate) fn data(&self) -> &vello_cpu::peniko::FontData {
        &self.data
    }

    pub(crate) fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A single line of shaped text, measured.
pub(crate) struct TextBlock {
    pub(crate) text: String,
    layout: parley::Layout<TextBrushRgba8>,
}

impl TextBlock {
    /// Advance width of the laid out text.
    pub(crate) fn width(&self) -> f32 {
        self.layout.width()
    }

    /// Distance from the layout top to the first baseline.
    pub(crate) fn baseline(&self) -> f32 {
        self.layout
            .lines()
            .next()
            .map(|l| l.metrics().baseline)
            .unwrap_or(0.0)
    }
}

/// Stateful helper for building Parley text layouts from raw font bytes.
///
/// Contexts are created per layout batch and dropped afterwards; only finished layouts are kept.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family: Option<String>,
}

impl TextLayoutEngine {
    pub(crate) fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            family: None,
        }
    }

    fn family_for(&mut self, font: &SceneFont) -> PresenterResult<String> {
        if let Some(f) = &self.family {
            return Ok(f.clone());
        }
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.bytes().to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            PresenterError::validation("no font families registered from font bytes")
        })?;
        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| PresenterError::validation("registered font family has no name"))?
            .to_string();
        self.family = Some(family_name.clone());
        Ok(family_name)
    }

    /// Shape one line of text without wrapping.
    pub(crate) fn layout_line(
        &mut self,
        font: &SceneFont,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> PresenterResult<TextBlock> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(PresenterError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        Ok(TextBlock {
            text: text.to_string(),
            layout,
        })
    }
}

/// Paint `block` with its first baseline starting at `(x, baseline_y)`.
pub(crate) fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    font: &SceneFont,
    block: &TextBlock,
    x: f64,
    baseline_y: f64,
) {
    let top = baseline_y - f64::from(block.baseline());
    ctx.set_transform(vello_cpu::kurbo::Affine::translate((x, top)));

    for line in block.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };

            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));

            let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(font.data())
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }

    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
}
