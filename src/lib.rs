//! tabscore — guitar tablature compiler.
//!
//! Turns the directive records produced by a tablature text parser into a
//! linked score model: a tablature stave and a standard-notation stave per
//! system, with spelled pitches, accidentals, ties, slides, bends, tuplets
//! and annotations resolved. Layout is left to a [`layout::LayoutEngine`];
//! a minimal SVG engine is included for previews.
//!
//! # Example
//! ```no_run
//! use tabscore::compile_json;
//!
//! let json = r#"[{"element":"tabstave","notes":[{"fret":"5","string":2}]}]"#;
//! let artist = compile_json(json).unwrap();
//! println!("Staves: {}", artist.score().staves.len());
//! ```

pub mod artist;
pub mod compiler;
pub mod config;
pub mod duration;
pub mod error;
pub mod input;
pub mod key_manager;
pub mod layout;
pub mod markup;
pub mod model;
pub mod music;
pub mod note;
pub mod playback;
pub mod svg;
pub mod tuning;

#[cfg(target_os = "android")]
pub mod android;

pub use artist::Artist;
pub use compiler::{compile_json, compile_json_with, Compiler};
pub use config::ArtistOptions;
pub use error::{CompileError, ErrorKind, Result};
pub use model::Score;
pub use playback::{build_schedule, Schedule};
pub use svg::SvgEngine;

/// Convert a compiled score to a JSON string.
pub fn score_to_json(score: &Score) -> Result<String> {
    serde_json::to_string_pretty(score)
        .map_err(|e| CompileError::input(format!("JSON serialization error: {e}")))
}

/// Compile a JSON directive list and return the score as JSON.
pub fn compile_json_to_json(json: &str) -> Result<String> {
    let artist = compile_json(json)?;
    score_to_json(artist.score())
}

/// Compile a JSON directive list and draw it with the built-in SVG engine.
///
/// `width` overrides the drawing width. Pass `None` to use the default
/// (800) or whatever the directives set with `options width=`.
pub fn render_json_to_svg(json: &str, width: Option<f64>) -> Result<String> {
    let mut options = ArtistOptions::default();
    if let Some(width) = width {
        options.width = width;
    }
    let mut artist = compile_json_with(json, options)?;
    let mut engine = SvgEngine::new();
    artist.render(&mut engine);
    Ok(engine.finish())
}

/// Compile a JSON directive list and return its playback schedule as JSON.
pub fn schedule_json(json: &str) -> Result<String> {
    let artist = compile_json(json)?;
    let schedule = build_schedule(&artist.player_data(), artist.customizations());
    Ok(playback::schedule_to_json(&schedule))
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Error object returned across the FFI in place of a result.
fn error_json(err: &CompileError) -> String {
    serde_json::json!({ "error": err }).to_string()
}

/// Read a C string argument; `None` for null or invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or a valid null-terminated C string.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Compile a JSON directive list and return the score JSON as a C string,
/// or `{"error": {...}}` when compilation fails.
/// The caller must free the returned string with `tabscore_free_string`.
///
/// # Safety
/// `json` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn tabscore_compile_json(json: *const c_char) -> *mut c_char {
    let Some(json) = (unsafe { read_str(json) }) else {
        return std::ptr::null_mut();
    };
    match compile_json_to_json(json) {
        Ok(out) => into_c_string(out),
        Err(e) => into_c_string(error_json(&e)),
    }
}

/// Compile a JSON directive list and return an SVG preview as a C string.
/// Returns null if compilation fails.
/// The caller must free the returned string with `tabscore_free_string`.
///
/// `width` sets the drawing width. Pass 0.0 to use the default.
///
/// # Safety
/// `json` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn tabscore_render_svg(json: *const c_char, width: f64) -> *mut c_char {
    let Some(json) = (unsafe { read_str(json) }) else {
        return std::ptr::null_mut();
    };
    let width = if width > 0.0 { Some(width) } else { None };
    match render_json_to_svg(json, width) {
        Ok(svg) => into_c_string(svg),
        Err(e) => {
            log::error!("render failed: {e}");
            std::ptr::null_mut()
        }
    }
}

/// Free a string previously returned by this library.
///
/// # Safety
/// `ptr` must have been returned by a `tabscore_*` function, or be null.
#[no_mangle]
pub unsafe extern "C" fn tabscore_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
