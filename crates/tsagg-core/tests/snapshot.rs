// File: crates/tsagg-core/tests/snapshot.rs
// Purpose: Golden snapshot harness with bless flow.
// Behavior:
// - Renders a deterministic aggregated series with the Skia backend to PNG bytes.
// - If env UPDATE_SNAPSHOTS=1, (re)writes the snapshot file.
// - Else, if snapshot exists, compares decoded pixels for exact match.
// - Else, fails when REQUIRE_SNAPSHOTS=1 or CI is set; otherwise logs a note to bless.
// - Always checks the render is reproducible and survives the PNG round trip.

use tsagg_core::raster::{decode_png, encode_png};
use tsagg_core::{Aggregator, Algorithm, Backend, Limits, RenderConfig, Series};

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

fn render_bytes() -> Vec<u8> {
    let _ = env_logger::builder().is_test(true).try_init();
    let values = (0..20_000).map(|i| (i as f64 * 0.003).sin() + ((i * 7919) % 101) as f64 * 0.004).collect();
    let reference = Series::from_values("snapshot", values);
    let agg = Aggregator::new(Algorithm::minmax_lttb()).aggregate(&reference, 800).expect("aggregate");
    let cfg = RenderConfig::default().with_limits(Limits::from_series(&reference).expect("limits"));
    let raster = Backend::Skia.render_series(&agg, &cfg).expect("render");
    encode_png(&raster).expect("encode")
}

#[test]
fn golden_minmax_lttb_skia() {
    let bytes = render_bytes();
    let again = render_bytes();
    let got = decode_png(&bytes).expect("decode render");
    assert_eq!(got, decode_png(&again).expect("decode second render"), "render is not reproducible");
    assert_eq!(got.dim(), (250, 800, 4));
    assert!(got.iter().skip(3).step_by(4).any(|&a| a > 0), "snapshot render has no ink");

    let snap_dir = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/__snapshots__");
    let snap_path = snap_dir.join("minmax_lttb_skia.png");

    let update = env_flag("UPDATE_SNAPSHOTS");

    if update {
        std::fs::create_dir_all(&snap_dir).expect("create snapshots dir");
        std::fs::write(&snap_path, &bytes).expect("write snapshot");
        eprintln!("[snapshot] Updated {} ({} bytes)", snap_path.display(), bytes.len());
        return;
    }

    if snap_path.exists() {
        let want = std::fs::read(&snap_path).expect("read snapshot");
        // Compare decoded pixel buffers to avoid PNG encoder variance
        let got_img = image::load_from_memory(&bytes).expect("decode got").to_rgba8();
        let want_img = image::load_from_memory(&want).expect("decode want").to_rgba8();
        assert_eq!(got_img.as_raw(), want_img.as_raw(), "rendered pixels differ from golden snapshot: {}", snap_path.display());
    } else if env_flag("REQUIRE_SNAPSHOTS") || std::env::var_os("CI").is_some() {
        panic!("missing golden snapshot {}; run with UPDATE_SNAPSHOTS=1 and commit it", snap_path.display());
    } else {
        eprintln!("[snapshot] Missing snapshot {}; set UPDATE_SNAPSHOTS=1 to bless.", snap_path.display());
    }
}
