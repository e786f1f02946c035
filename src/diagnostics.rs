//! Structured reporting for leak detection, corruption, and soft-failure
//! log-and-continue paths.
//!
//! Routes through the `log` crate's facade when the `log` feature is
//! enabled (grounded on the teacher crate's own optional `log` dependency
//! and `diagnostics::emit` split between event and sink); falls back to a
//! plain stderr/stdout reporter otherwise, since the pool and ECS have to
//! report leaks and corruption even in a host binary that never installs a
//! logger.

#[cfg(feature = "log")]
pub(crate) fn info(message: &str) {
    log::info!("{message}");
}

#[cfg(not(feature = "log"))]
pub(crate) fn info(message: &str) {
    println!("[INFO] {message}");
}

#[cfg(feature = "log")]
pub(crate) fn warn(message: &str) {
    log::warn!("{message}");
}

#[cfg(not(feature = "log"))]
pub(crate) fn warn(message: &str) {
    eprintln!("[WARN] {message}");
}

#[cfg(feature = "log")]
pub(crate) fn error(message: &str) {
    log::error!("{message}");
}

#[cfg(not(feature = "log"))]
pub(crate) fn error(message: &str) {
    eprintln!("[ERROR] {message}");
}

#[cfg(feature = "log")]
pub(crate) fn debug(message: &str) {
    log::debug!("{message}");
}

#[cfg(not(feature = "log"))]
pub(crate) fn debug(message: &str) {
    println!("[DEBUG] {message}");
}
