//! Integration tests for rpg-bitmap surfaces.

use rpg_bitmap::{
    Bitmap, BitmapError, BltParams, FontConfig, LoadState, Rect, RenderSource, SharedFonts,
    TextAlign,
};
use rstest::rstest;

fn fonts() -> SharedFonts {
    FontConfig::empty().resolve().into_shared()
}

fn bitmap(width: i32, height: i32) -> Bitmap {
    Bitmap::with_fonts(width, height, fonts()).unwrap()
}

/// Test a new bitmap has the requested size and is fully transparent.
#[test]
fn test_new_bitmap_is_transparent() {
    let bitmap = bitmap(32, 16);
    assert_eq!(bitmap.rect(), Rect::new(0.0, 0.0, 32.0, 16.0));
    for y in 0..16 {
        for x in 0..32 {
            assert_eq!(bitmap.get_alpha_pixel(x, y).unwrap(), 0);
        }
    }
}

/// Test fill then read back a pixel.
#[test]
fn test_fill_rect_then_get_pixel() {
    let mut bitmap = bitmap(10, 10);
    bitmap.fill_rect(0.0, 0.0, 10.0, 10.0, "#ff0000").unwrap();
    assert_eq!(bitmap.get_pixel(5, 5).unwrap(), "#ff0000");
}

/// Test out-of-bounds reads return the transparent default.
#[rstest]
#[case(-1, 0)]
#[case(0, -1)]
#[case(8, 0)]
#[case(0, 8)]
#[case(i32::MAX, i32::MIN)]
fn test_out_of_bounds_pixels(#[case] x: i32, #[case] y: i32) {
    let mut bitmap = bitmap(8, 8);
    bitmap.fill_all("white").unwrap();
    assert_eq!(bitmap.get_pixel(x, y).unwrap(), "#000000");
    assert_eq!(bitmap.get_alpha_pixel(x, y).unwrap(), 0);
}

/// Test resizing keeps the top-left overlap and clears the rest.
#[test]
fn test_resize_round_trip() {
    let mut bitmap = bitmap(4, 4);
    bitmap.fill_all("#00ff00").unwrap();

    bitmap.resize(2, 2).unwrap();
    assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
    assert_eq!(bitmap.get_pixel(1, 1).unwrap(), "#00ff00");

    bitmap.resize(4, 4).unwrap();
    assert_eq!((bitmap.width(), bitmap.height()), (4, 4));
    assert_eq!(bitmap.get_pixel(1, 1).unwrap(), "#00ff00");
    assert_eq!(bitmap.get_alpha_pixel(2, 2).unwrap(), 0);
    assert_eq!(bitmap.get_alpha_pixel(3, 0).unwrap(), 0);
}

/// Test growing then shrinking back restores every pixel exactly.
#[test]
fn test_resize_grow_and_back_is_exact() {
    let mut bitmap = bitmap(3, 3);
    bitmap.fill_all("rgba(200, 100, 50, 0.6)").unwrap();
    bitmap.fill_rect(1.0, 0.0, 1.0, 2.0, "rgba(0, 128, 255, 0.25)").unwrap();
    bitmap.fill_rect(2.0, 2.0, 1.0, 1.0, "#abcdef").unwrap();
    let before: Vec<_> = (0..9)
        .map(|i| {
            let (x, y) = (i % 3, i / 3);
            (bitmap.get_pixel(x, y).unwrap(), bitmap.get_alpha_pixel(x, y).unwrap())
        })
        .collect();
    let texture_before = bitmap.base_texture().unwrap().pixels().to_vec();

    bitmap.resize(10, 10).unwrap();
    assert_eq!(bitmap.get_alpha_pixel(9, 9).unwrap(), 0);
    bitmap.resize(3, 3).unwrap();

    let after: Vec<_> = (0..9)
        .map(|i| {
            let (x, y) = (i % 3, i / 3);
            (bitmap.get_pixel(x, y).unwrap(), bitmap.get_alpha_pixel(x, y).unwrap())
        })
        .collect();
    assert_eq!(after, before);
    assert_eq!(bitmap.base_texture().unwrap().pixels(), &texture_before[..]);
}

/// Test resize rejects invalid sizes and leaves the bitmap untouched.
#[rstest]
#[case(-1, 4)]
#[case(4, -1)]
#[case(40000, 4)]
fn test_resize_invalid(#[case] width: i32, #[case] height: i32) {
    let mut bitmap = bitmap(4, 4);
    assert!(matches!(
        bitmap.resize(width, height),
        Err(BitmapError::InvalidDimension { .. })
    ));
    assert_eq!((bitmap.width(), bitmap.height()), (4, 4));
}

/// Test an unscaled blt copies pixels exactly.
#[test]
fn test_exact_unscaled_blt() {
    let mut source = bitmap(3, 3);
    source.fill_rect(0.0, 0.0, 3.0, 3.0, "rgba(10, 20, 30, 0.6)").unwrap();
    source.fill_rect(1.0, 1.0, 1.0, 1.0, "#abcdef").unwrap();

    let mut dest = bitmap(5, 5);
    dest.blt(&source, &BltParams::new(0.0, 0.0, 3.0, 3.0, 2.0, 2.0))
        .unwrap();

    for y in 0..3 {
        for x in 0..3 {
            assert_eq!(
                dest.get_pixel(x + 2, y + 2).unwrap(),
                source.get_pixel(x, y).unwrap()
            );
            assert_eq!(
                dest.get_alpha_pixel(x + 2, y + 2).unwrap(),
                source.get_alpha_pixel(x, y).unwrap()
            );
        }
    }
    assert_eq!(dest.get_alpha_pixel(1, 1).unwrap(), 0);
}

/// Test a downscaled blt with bilinear sampling averages the source.
#[test]
fn test_scaled_blt_smooth() {
    let mut source = bitmap(2, 1);
    source.fill_rect(0.0, 0.0, 1.0, 1.0, "#000000").unwrap();
    source.fill_rect(1.0, 0.0, 1.0, 1.0, "#ffffff").unwrap();

    let mut dest = bitmap(8, 1);
    dest.blt(
        &source,
        &BltParams::new(0.0, 0.0, 2.0, 1.0, 0.0, 0.0).scaled_to(8.0, 1.0),
    )
    .unwrap();
    let red = |x| u8::from_str_radix(&dest.get_pixel(x, 0).unwrap()[1..3], 16).unwrap();
    assert!(red(0) < red(4));
    assert!(red(3) > 0 && red(3) < 255);
    assert_eq!(dest.get_alpha_pixel(7, 0).unwrap(), 255);
}

/// Test text measurement of empty text.
#[test]
fn test_measure_text_width_empty() {
    let bitmap = Bitmap::new(1, 1).unwrap();
    assert_eq!(bitmap.measure_text_width("").unwrap(), 0.0);
}

/// Test text measurement grows with font size.
#[test]
fn test_measure_text_width_monotonic() {
    let mut bitmap = Bitmap::new(1, 1).unwrap();
    let mut previous = 0.0;
    for size in [10.0, 20.0, 30.0] {
        bitmap.set_font_size(size);
        let width = bitmap.measure_text_width("Hello").unwrap();
        assert!(width >= previous);
        previous = width;
    }
}

/// Test style changes round trip through the accessors.
#[test]
fn test_text_style_accessors() {
    let mut bitmap = bitmap(1, 1);
    {
        let style = bitmap.text_style_mut();
        style.font_face = "rmmz-mainfont, Verdana, sans-serif".to_string();
        style.font_bold = true;
        style.text_color = "#ffff00".to_string();
    }
    bitmap.set_font_size(28.0);
    bitmap.set_outline_width(4.0);

    let style = bitmap.text_style();
    assert_eq!(style.font_size(), 28.0);
    assert_eq!(style.outline_width(), 4.0);
    assert_eq!(style.font_name_text(), "Bold 28px rmmz-mainfont, Verdana, sans-serif");
    assert_eq!(
        style.families().collect::<Vec<_>>(),
        vec!["rmmz-mainfont", "Verdana", "sans-serif"]
    );
}

/// Test text drawing on a bitmap without fonts succeeds without drawing.
#[test]
fn test_draw_text_without_fonts() {
    let mut bitmap = bitmap(64, 32);
    bitmap
        .draw_text("Attack", 0.0, 0.0, Some(64.0), 32.0, TextAlign::Center)
        .unwrap();
    assert_eq!(bitmap.load_state(), LoadState::Ready);
    for y in 0..32 {
        for x in 0..64 {
            assert_eq!(bitmap.get_alpha_pixel(x, y).unwrap(), 0);
        }
    }
}

/// Test text measures as zero width when no font faces are loaded.
#[test]
fn test_measure_text_width_without_fonts() {
    let bitmap = bitmap(4, 4);
    assert_eq!(bitmap.measure_text_width("Hi").unwrap(), 0.0);
}

/// Draws a checkerboard of the two colors.
struct Checkerboard {
    size: u32,
    colors: [&'static str; 2],
}

impl RenderSource for Checkerboard {
    fn output_size(&self) -> (u32, u32) {
        (self.size, self.size)
    }

    fn render_to(&self, target: &mut Bitmap) -> rpg_bitmap::BitmapResult<()> {
        for y in 0..self.size {
            for x in 0..self.size {
                let color = self.colors[((x + y) % 2) as usize];
                target.fill_rect(x as f32, y as f32, 1.0, 1.0, color)?;
            }
        }
        Ok(())
    }
}

/// Test snapping a render source.
#[test]
fn test_snap() {
    let board = Checkerboard {
        size: 4,
        colors: ["#ff0000", "#0000ff"],
    };
    let snap = Bitmap::snap(&board).unwrap();
    assert_eq!((snap.width(), snap.height()), (4, 4));
    assert_eq!(snap.get_pixel(0, 0).unwrap(), "#ff0000");
    assert_eq!(snap.get_pixel(1, 0).unwrap(), "#0000ff");
    assert_eq!(snap.get_pixel(3, 3).unwrap(), "#ff0000");
}

/// Test the texture follows the pixels after drawing.
#[test]
fn test_base_texture_in_sync() {
    let mut bitmap = bitmap(2, 2);
    bitmap.fill_all("#102030").unwrap();
    let texture = bitmap.base_texture().unwrap();
    assert_eq!((texture.width(), texture.height()), (2, 2));
    assert_eq!(&texture.pixels()[..4], &[0x10, 0x20, 0x30, 0xff]);

    bitmap.resize(3, 1).unwrap();
    let texture = bitmap.base_texture().unwrap();
    assert_eq!((texture.width(), texture.height()), (3, 1));
    assert_eq!(texture.pixels().len(), 12);
}
