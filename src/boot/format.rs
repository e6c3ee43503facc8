// ── Surface and context feature profile ───────────────────────────────────────
//
// Pure data: what the final surface and context must look like, and how
// that is spelled as zero-terminated WGL attribute lists.  No Win32 imports.

/// Tokens from `wglext.h` (WGL_ARB_pixel_format, WGL_ARB_create_context,
/// WGL_ARB_create_context_profile).
pub(crate) mod wgl {
    pub(crate) const DRAW_TO_WINDOW_ARB: i32 = 0x2001;
    pub(crate) const ACCELERATION_ARB: i32 = 0x2003;
    pub(crate) const SWAP_METHOD_ARB: i32 = 0x2007;
    pub(crate) const SUPPORT_OPENGL_ARB: i32 = 0x2010;
    pub(crate) const DOUBLE_BUFFER_ARB: i32 = 0x2011;
    pub(crate) const PIXEL_TYPE_ARB: i32 = 0x2013;
    pub(crate) const COLOR_BITS_ARB: i32 = 0x2014;
    pub(crate) const ALPHA_BITS_ARB: i32 = 0x201B;
    pub(crate) const DEPTH_BITS_ARB: i32 = 0x2022;
    pub(crate) const FULL_ACCELERATION_ARB: i32 = 0x2027;
    pub(crate) const SWAP_COPY_ARB: i32 = 0x2029;
    pub(crate) const TYPE_RGBA_ARB: i32 = 0x202B;

    pub(crate) const CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
    pub(crate) const CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
    pub(crate) const CONTEXT_FLAGS_ARB: i32 = 0x2094;
    pub(crate) const CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;
    pub(crate) const CONTEXT_DEBUG_BIT_ARB: i32 = 0x0001;
    pub(crate) const CONTEXT_CORE_PROFILE_BIT_ARB: i32 = 0x0001;

    pub(crate) const TRUE: i32 = 1;
    /// List terminator.
    pub(crate) const END: i32 = 0;
}

// ── Pixel format ──────────────────────────────────────────────────────────────

/// Attribute set describing the renderable surface.
///
/// The baseline chooser only understands the draw/GL/double-buffer flags,
/// pixel type and bit depths.  The extended chooser additionally asks for
/// copy swaps and, when `full_acceleration` is set, a hardware format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PixelFormatRequest {
    pub(crate) color_bits: u8,
    pub(crate) alpha_bits: u8,
    pub(crate) depth_bits: u8,
    pub(crate) double_buffer: bool,
    pub(crate) full_acceleration: bool,
}

impl PixelFormatRequest {
    /// 32-bit RGBA, 8-bit alpha, 24-bit depth, double-buffered, hardware
    /// accelerated, copy swap.
    pub(crate) const STANDARD: Self = Self {
        color_bits: 32,
        alpha_bits: 8,
        depth_bits: 24,
        double_buffer: true,
        full_acceleration: true,
    };

    /// Attribute list for `wglChoosePixelFormatARB`, zero-terminated.
    pub(crate) fn attrib_list(&self) -> Vec<i32> {
        let mut attribs = vec![
            wgl::DRAW_TO_WINDOW_ARB,
            wgl::TRUE,
            wgl::SUPPORT_OPENGL_ARB,
            wgl::TRUE,
            wgl::DOUBLE_BUFFER_ARB,
            i32::from(self.double_buffer),
            wgl::SWAP_METHOD_ARB,
            wgl::SWAP_COPY_ARB,
            wgl::PIXEL_TYPE_ARB,
            wgl::TYPE_RGBA_ARB,
        ];
        if self.full_acceleration {
            attribs.extend([wgl::ACCELERATION_ARB, wgl::FULL_ACCELERATION_ARB]);
        }
        attribs.extend([
            wgl::COLOR_BITS_ARB,
            i32::from(self.color_bits),
            wgl::ALPHA_BITS_ARB,
            i32::from(self.alpha_bits),
            wgl::DEPTH_BITS_ARB,
            i32::from(self.depth_bits),
            wgl::END,
        ]);
        attribs
    }
}

// ── Context ───────────────────────────────────────────────────────────────────

/// Requested capability level of the final rendering context.  Always a
/// core profile.
///
/// There is no negotiation: if the driver cannot create exactly this, the
/// bootstrap fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContextAttributes {
    pub(crate) major: i32,
    pub(crate) minor: i32,
    pub(crate) debug: bool,
}

impl ContextAttributes {
    /// OpenGL 4.3 core profile with the debug flag set.
    pub(crate) const GL_4_3_CORE_DEBUG: Self = Self {
        major: 4,
        minor: 3,
        debug: true,
    };

    /// Attribute list for `wglCreateContextAttribsARB`, zero-terminated.
    pub(crate) fn attrib_list(&self) -> Vec<i32> {
        let mut attribs = vec![
            wgl::CONTEXT_MAJOR_VERSION_ARB,
            self.major,
            wgl::CONTEXT_MINOR_VERSION_ARB,
            self.minor,
            wgl::CONTEXT_PROFILE_MASK_ARB,
            wgl::CONTEXT_CORE_PROFILE_BIT_ARB,
        ];
        if self.debug {
            attribs.extend([wgl::CONTEXT_FLAGS_ARB, wgl::CONTEXT_DEBUG_BIT_ARB]);
        }
        attribs.push(wgl::END);
        attribs
    }
}
