//! Error diffusion kernels.

/// An error diffusion kernel.
///
/// Each entry is `(dx, dy, weight)`: the neighbor at offset `(dx, dy)`
/// receives `error * weight / divisor`. Offsets only point at pixels that
/// have not been visited yet in a left-to-right, top-to-bottom scan.
#[derive(Debug, Clone, Copy)]
pub struct Kernel {
    /// (dx, dy, weight) entries for error diffusion.
    pub entries: &'static [(i32, i32, u8)],

    /// Total divisor for normalizing weights.
    pub divisor: u8,

    /// Maximum dy value in entries.
    ///
    /// The error buffer keeps `max_dy + 1` rows.
    pub max_dy: usize,
}

/// Floyd-Steinberg dithering kernel.
///
/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[
        (1, 0, 7),  // right
        (-1, 1, 3), // bottom-left
        (0, 1, 5),  // bottom
        (1, 1, 1),  // bottom-right
    ],
    divisor: 16,
    max_dy: 1,
};
