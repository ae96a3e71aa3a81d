//! Literal formatting shared by every generator.
//!
//! Numbers print the way a JavaScript template literal would interpolate them:
//! the shortest decimal that round-trips, no trailing `.0` (`1.0` prints as `1`).

use crate::color::HexColor;

pub fn number(v: f32) -> String {
    let s = v.to_string();
    if s == "-0" {
        "0".to_string()
    } else {
        s
    }
}

/// Optional display parameters are baked as `1.0` when unset.
pub fn number_or_one(v: Option<f32>) -> String {
    match v {
        Some(v) => number(v),
        None => "1.0".to_string(),
    }
}

/// The three normalized channels, comma-separated, computed in double precision.
pub fn channels(c: &HexColor) -> String {
    let [r, g, b] = c.bytes();
    let ch = |b: u8| (f64::from(b) / 255.0).to_string();
    format!("{}, {}, {}", ch(r), ch(g), ch(b))
}

pub fn vector3(c: &HexColor) -> String {
    format!("new THREE.Vector3({})", channels(c))
}

pub fn boolean(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Indent every non-empty line of `src` by `n` spaces.
pub fn indent(src: &str, n: usize) -> String {
    let pad = " ".repeat(n);
    let mut out = String::with_capacity(src.len() + src.lines().count() * n);
    for line in src.lines() {
        if !line.is_empty() {
            out.push_str(&pad);
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}
