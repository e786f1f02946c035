//! Build script for enginecore.
//!
//! Emits build-time diagnostics for feature combinations worth a nudge; no
//! codegen.

use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_DEBUG");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_PARKING_LOT");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_LOG");

    let debug_enabled = env::var("CARGO_FEATURE_DEBUG").is_ok();
    let parking_lot_enabled = env::var("CARGO_FEATURE_PARKING_LOT").is_ok();
    let log_enabled = env::var("CARGO_FEATURE_LOG").is_ok();

    let profile = env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());
    let is_release = profile == "release";

    if debug_enabled {
        emit_info("debug feature enabled: leak reports will carry allocation backtraces");
        if is_release {
            emit_warning("debug features enabled in a release build; this costs performance");
        }
    }

    if log_enabled {
        emit_info("routing diagnostics through the `log` crate instead of stderr");
    }

    if is_release && !parking_lot_enabled {
        emit_note("tip: enable the 'parking_lot' feature for faster mutexes under contention");
    }

    check_target();
}

fn emit_info(msg: &str) {
    println!("cargo:warning=[enginecore] {msg}");
}

fn emit_note(msg: &str) {
    println!("cargo:warning=[enginecore]   {msg}");
}

fn emit_warning(msg: &str) {
    println!("cargo:warning=[enginecore] warning: {msg}");
}

fn check_target() {
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("wasm") {
        emit_warning("wasm target detected; dynamic plugin loading is unavailable there");
    }
}
