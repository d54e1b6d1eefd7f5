use pixmap_filters::{engine, Error, Execution, PixMap, Pixel, Plugin};

/// 5×4 truecolor, Adam7 interlaced; pixel (x, y) is (50x, 60y, 100).
const GRADIENT: &[u8] = include_bytes!("gradient.png");
/// 3×2, 4-bit palette with tRNS.
const PALETTE: &[u8] = include_bytes!("palette.png");

fn render(map: &PixMap) -> String {
    map.rows()
        .map(|row| {
            row.iter()
                .map(|p| format!("{:02x}{:02x}{:02x}{:02x}", p.red, p.green, p.blue, p.alpha))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn gradient() -> PixMap {
    PixMap::decode(GRADIENT).unwrap()
}

fn run(map: &PixMap, tokens: &[&str]) -> pixmap_filters::Result<PixMap> {
    engine::apply_all(map, &Plugin::parse_all(tokens)?)
}

#[test]
fn decodes_interlaced_fixture() {
    let map = gradient();
    assert_eq!((map.width(), map.height()), (5, 4));
    for row in 0..4 {
        for col in 0..5 {
            assert_eq!(
                map.get(row, col).unwrap(),
                Pixel::opaque(col as u8 * 50, row as u8 * 60, 100)
            );
        }
    }
}

#[test]
fn decodes_paletted_fixture() {
    let map = PixMap::decode(PALETTE).unwrap();
    insta::assert_snapshot!(render(&map), @r"
    ff0000ff 00ff0080 0000ffff
    ffffffff ff0000ff 00ff0080
    ");
}

#[test]
fn opposite_flips_commute() {
    let map = gradient();
    let hv = run(&map, &["flipHorizontal", "flipVertical"]).unwrap();
    let vh = run(&map, &["--flipVertical", "--flipHorizontal"]).unwrap();
    assert_eq!(hv, vh);
    assert_eq!(hv.get(0, 0).unwrap(), map.get(3, 4).unwrap());
}

#[test]
fn half_turn_shifts_by_one_pixel() {
    let rotated = run(&gradient(), &["rotate", "180"]).unwrap();
    insta::assert_snapshot!(render(&rotated), @r"
    00000000 00000000 00000000 00000000 00000000
    00000000 c8b464ff 96b464ff 64b464ff 32b464ff
    00000000 c87864ff 967864ff 647864ff 327864ff
    00000000 c83c64ff 963c64ff 643c64ff 323c64ff
    ");
}

#[test]
fn quarter_turn_is_counter_clockwise_about_the_center() {
    let rotated = run(&gradient(), &["--rotate", "90"]).unwrap();
    insta::assert_snapshot!(render(&rotated), @r"
    00000000 00000000 00000000 00000000 00000000
    c80064ff c83c64ff c87864ff c8b464ff 00000000
    960064ff 963c64ff 967864ff 96b464ff 00000000
    640064ff 643c64ff 647864ff 64b464ff 00000000
    ");
}

#[test]
fn box_blur_truncates_every_term() {
    let blurred = run(
        &gradient(),
        &["convolution", "1", "1", "1", "1", "1", "1", "1", "1", "1"],
    )
    .unwrap();
    // A flat alpha of 255 comes out as 252: nine truncations of 255/9.
    insta::assert_snapshot!(render(&blurred), @r"
    0f1263fc 301263fc 601263fc 931263fc b41263fc
    0f3963fc 303963fc 603963fc 933963fc b43963fc
    0f7563fc 307563fc 607563fc 937563fc b47563fc
    0f9f63fc 309f63fc 609f63fc 939f63fc b49f63fc
    ");
}

#[test]
fn sharpen_clamps_to_channel_range() {
    let sharpened = run(
        &gradient(),
        &["convolution", "0", "-1", "0", "-1", "5", "-1", "0", "-1", "0"],
    )
    .unwrap();
    insta::assert_snapshot!(render(&sharpened), @r"
    000064ff 320064ff 640064ff 960064ff fa0064ff
    003c64ff 323c64ff 643c64ff 963c64ff fa3c64ff
    007864ff 327864ff 647864ff 967864ff fa7864ff
    00f064ff 32f064ff 64f064ff 96f064ff faf064ff
    ");
}

#[test]
fn edge_detector_takes_magnitudes() {
    let edges = run(
        &gradient(),
        &["convolution", "-1", "-1", "-1", "-1", "8", "-1", "-1", "-1", "-1"],
    )
    .unwrap();
    insta::assert_snapshot!(render(&edges), @r"
    96b4ffff ffb4ffff ffb4ffff ffb4ffff ffb4ffff
    96ffffff ffffffff ffffffff ffffffff ffffffff
    96ffffff ffffffff ffffffff ffffffff ffffffff
    96ffffff ffffffff ffffffff ffffffff ffffffff
    ");
}

#[test]
fn execution_modes_agree_on_fixture() {
    let map = gradient();
    let plugins = Plugin::parse_all(&[
        "rotate",
        "33.3",
        "convolution",
        "1", "2", "1",
        "0", "0", "0",
        "-1", "-2", "-1",
    ])
    .unwrap();
    for plugin in &plugins {
        assert_eq!(
            engine::apply_with(&map, plugin, Execution::Sequential).unwrap(),
            engine::apply_with(&map, plugin, Execution::Parallel).unwrap(),
        );
    }
}

#[test]
fn failed_parse_reports_the_token() {
    let err = run(&gradient(), &["flipVertical", "blur"]).unwrap_err();
    assert!(matches!(&err, Error::UnknownFilter(token) if token == "blur"));
    let err = run(&gradient(), &["rotate", "ninety"]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { filter: "rotate", .. }));
}

#[test]
fn filtered_output_survives_png_and_bmp() {
    let dir = std::env::temp_dir().join(format!("pixmap-filters-it-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let filtered = run(&gradient(), &["flipHorizontal"]).unwrap();

    let png_path = dir.join("out.png");
    filtered.write(&png_path).unwrap();
    assert_eq!(PixMap::read(&png_path).unwrap(), filtered);

    let bmp_path = dir.join("out.bmp");
    filtered.write_bmp16(&bmp_path).unwrap();
    let bmp = std::fs::read(&bmp_path).unwrap();
    // 66 header bytes, then four rows of five pixels padded to 12 bytes.
    assert_eq!(bmp.len(), 66 + 4 * 12);
    assert_eq!(&bmp[..2], b"BM");
    // Bottom-up: the first stored pixel is the last row's first column.
    let first = u16::from_le_bytes([bmp[66], bmp[67]]);
    assert_eq!(first, filtered.get(3, 0).unwrap().to_rgb565());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_input_carries_a_code() {
    let mut bytes = GRADIENT.to_vec();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    match PixMap::decode(&bytes) {
        Err(Error::Decode { code, message }) => {
            assert_eq!(code, 57);
            assert!(message.contains("IEND"), "{message}");
        }
        other => panic!("unexpected {other:?}"),
    }
}
