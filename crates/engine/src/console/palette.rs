/// Reserved color index used as the compositing key. Cells whose background
/// resolves to this index are skipped when a buffer is blitted.
pub const KEY_COLOR: u8 = 16;

pub const PALETTE_LEN: usize = 17;

/// CGA palette in index order, followed by the key color.
pub const PALETTE_RGB: [[u8; 3]; PALETTE_LEN] = [
    [0, 0, 0],
    [0, 0, 170],
    [0, 170, 0],
    [0, 170, 170],
    [170, 0, 0],
    [170, 0, 170],
    [170, 85, 0],
    [170, 170, 170],
    [85, 85, 85],
    [85, 85, 255],
    [85, 255, 85],
    [85, 255, 255],
    [255, 85, 85],
    [255, 85, 255],
    [255, 255, 85],
    [255, 255, 255],
    [255, 0, 255],
];

pub const BLACK: u8 = 0;
pub const LIGHT_GRAY: u8 = 7;

/// Resolves a palette index to RGBA. Indices past the key color wrap into the
/// 16-color range.
pub fn palette_rgba(index: u8) -> [u8; 4] {
    let resolved = if (index as usize) < PALETTE_LEN {
        index as usize
    } else {
        (index % 16) as usize
    };
    let [r, g, b] = PALETTE_RGB[resolved];
    [r, g, b, 255]
}
