//! End-to-end tests of the `artpaint` binary.

mod common;

use artpaint::rendering::load_png;
use artpaint_filters::Color;
use common::fixtures::{self, BLUR_DITHER_TRACE};
use common::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;

#[test]
fn test_blur_writes_same_size_png() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(20, 10));

    cli.run(&["blur", "-i", "in.png", "-o", "out.png", "--radius", "3"])
        .assert_success();
    assert_png(&cli.path("out.png"), 20, 10);
}

#[test]
fn test_uniform_image_survives_blur() {
    let cli = TestCli::new();
    let red = artpaint_filters::PixelBuffer::filled(4, 4, Color::rgb(255, 0, 0)).unwrap();
    fixtures::write_image(cli.root(), "red.png", &red);

    cli.run(&["blur", "-i", "red.png", "-o", "out.png", "-r", "3"])
        .assert_success();
    assert_eq!(load_png(&cli.path("out.png")).unwrap(), red);
}

#[test]
fn test_dither_fixed_palette() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(16, 16));

    cli.run(&[
        "dither",
        "-i",
        "in.png",
        "-o",
        "out.png",
        "--colors",
        "#000000,#FFFFFF",
    ])
    .assert_success();
    let out = assert_png(&cli.path("out.png"), 16, 16);
    assert_only_colors(&out, &[Color::BLACK, Color::WHITE]);
}

#[test]
fn test_dither_generated_palette_size() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(32, 32));

    cli.run(&[
        "dither",
        "-i",
        "in.png",
        "-o",
        "out.png",
        "--algorithm",
        "n-candidate",
        "--palette-size",
        "4",
        "--seed",
        "7",
    ])
    .assert_success();
    let out = assert_png(&cli.path("out.png"), 32, 32);
    let distinct: HashSet<Color> = out.iter().collect();
    assert!(distinct.len() <= 4, "got {} colors", distinct.len());
}

#[test]
fn test_dither_with_mask_keeps_unselected_pixels() {
    let cli = TestCli::new();
    let source = fixtures::gradient(10, 6);
    fixtures::write_image(cli.root(), "in.png", &source);
    fixtures::write_image(cli.root(), "mask.png", &fixtures::rectangle(10, 6, 0, 0, 5, 6));

    cli.run(&[
        "dither",
        "-i",
        "in.png",
        "-o",
        "out.png",
        "--mask",
        "mask.png",
        "--colors",
        "#000,#fff",
    ])
    .assert_success();
    let out = assert_png(&cli.path("out.png"), 10, 6);
    assert_same_outside(&source, &out, |x, _| x < 5);
}

#[test]
fn test_equalize_runs() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(40, 30));

    cli.run(&[
        "equalize",
        "-i",
        "in.png",
        "-o",
        "out.png",
        "--tile-size",
        "16",
        "--clip-limit",
        "20",
    ])
    .assert_success();
    assert_png(&cli.path("out.png"), 40, 30);
}

#[test]
fn test_trace_prints_json() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::rectangle(8, 6, 2, 1, 3, 2));

    let output = cli.run(&["trace", "-i", "in.png"]);
    output.assert_success();

    let report: serde_json::Value = serde_json::from_str(&output.stdout()).unwrap();
    assert_eq!(report["width"], 8);
    assert_eq!(report["polygons"].as_array().unwrap().len(), 1);
    assert_eq!(report["polygons"][0]["winding"], "clockwise");
    assert_eq!(
        report["polygons"][0]["points"],
        serde_json::json!([[2, 1], [3, 1], [4, 1], [4, 2], [3, 2], [2, 2]])
    );
}

#[test]
fn test_run_pipeline_writes_image_and_polygons() {
    let cli = TestCli::new();
    fixtures::write_image(
        cli.root(),
        "in.png",
        &fixtures::rectangle(12, 10, 3, 3, 5, 4),
    );
    fixtures::write_pipeline(cli.root(), "pipeline.yaml", BLUR_DITHER_TRACE);

    cli.run(&[
        "run",
        "--config",
        "pipeline.yaml",
        "-i",
        "in.png",
        "-o",
        "out.png",
        "--polygons",
        "outlines.json",
    ])
    .assert_success();

    let out = assert_png(&cli.path("out.png"), 12, 10);
    assert_only_colors(&out, &[Color::BLACK, Color::WHITE]);

    let json = std::fs::read_to_string(cli.path("outlines.json")).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["polygons"][0]["selection"], true);
}

#[test]
fn test_missing_input_fails() {
    let cli = TestCli::new();
    let output = cli.run(&["blur", "-i", "nope.png", "-o", "out.png"]);

    assert!(!output.success());
    assert!(output.stderr().contains("Failed to read"), "{}", output.stderr());
    assert!(!cli.path("out.png").exists());
}

#[test]
fn test_mask_size_mismatch_fails() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(8, 8));
    fixtures::write_image(cli.root(), "mask.png", &fixtures::gradient(4, 4));

    let output = cli.run(&["blur", "-i", "in.png", "-o", "out.png", "--mask", "mask.png"]);
    assert!(!output.success());
    assert!(output.stderr().contains("Failed to load mask"), "{}", output.stderr());
}

#[test]
fn test_unknown_algorithm_fails() {
    let cli = TestCli::new();
    fixtures::write_image(cli.root(), "in.png", &fixtures::gradient(8, 8));

    let output = cli.run(&["dither", "-i", "in.png", "-o", "out.png", "-a", "ordered"]);
    assert!(!output.success());
    assert!(
        output.stderr().contains("unknown dither algorithm"),
        "{}",
        output.stderr()
    );
}
