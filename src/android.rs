//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::{jfloat, jstring};
use jni::JNIEnv;

use crate::{compile_json_to_json, render_json_to_svg, schedule_json};

fn to_jstring(env: &mut JNIEnv, s: &str) -> jstring {
    match env.new_string(s) {
        Ok(js) => js.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Compile parsed tab directives to score JSON.
///
/// Called from Kotlin as:
///   external fun compile(directives: String): String?
#[no_mangle]
pub extern "system" fn Java_com_tabscore_app_TabScore_compile(
    mut env: JNIEnv,
    _class: JClass,
    directives: JString,
) -> jstring {
    let json: String = match env.get_string(&directives) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    match compile_json_to_json(&json) {
        Ok(score) => to_jstring(&mut env, &score),
        Err(e) => {
            let _ = env.throw_new("java/lang/IllegalArgumentException", e.to_string());
            std::ptr::null_mut()
        }
    }
}

/// Compile parsed tab directives and draw an SVG preview.
///
/// Called from Kotlin as:
///   external fun renderSvg(directives: String, width: Float): String?
#[no_mangle]
pub extern "system" fn Java_com_tabscore_app_TabScore_renderSvg(
    mut env: JNIEnv,
    _class: JClass,
    directives: JString,
    width: jfloat,
) -> jstring {
    let json: String = match env.get_string(&directives) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let width = if width > 0.0 { Some(width as f64) } else { None };

    match render_json_to_svg(&json, width) {
        Ok(svg) => to_jstring(&mut env, &svg),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Compile parsed tab directives to a playback schedule.
///
/// Called from Kotlin as:
///   external fun schedule(directives: String): String?
#[no_mangle]
pub extern "system" fn Java_com_tabscore_app_TabScore_schedule(
    mut env: JNIEnv,
    _class: JClass,
    directives: JString,
) -> jstring {
    let json: String = match env.get_string(&directives) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    match schedule_json(&json) {
        Ok(schedule) => to_jstring(&mut env, &schedule),
        Err(_) => std::ptr::null_mut(),
    }
}
