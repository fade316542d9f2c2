//! Locating a local Tesseract installation.
//!
//! The glyph backend shells out to the `tesseract` binary; this module
//! finds the executable and its language data. Nothing is downloaded;
//! a missing install is a construction-time error.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::process::Command;

/// Install locations checked after PATH.
#[cfg(windows)]
const COMMON_EXECUTABLES: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

#[cfg(not(windows))]
const COMMON_EXECUTABLES: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
];

#[cfg(windows)]
const COMMON_TESSDATA: &[&str] = &[
    r"C:\Program Files\Tesseract-OCR\tessdata",
    r"C:\Program Files (x86)\Tesseract-OCR\tessdata",
];

#[cfg(not(windows))]
const COMMON_TESSDATA: &[&str] = &[
    "/usr/share/tesseract-ocr/5/tessdata",
    "/usr/share/tesseract-ocr/4.00/tessdata",
    "/usr/share/tessdata",
    "/usr/local/share/tessdata",
    "/opt/homebrew/share/tessdata",
];

/// Finds the Tesseract executable, checking PATH first, then common
/// install locations.
pub fn find_tesseract_executable() -> Result<PathBuf> {
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for path in COMMON_EXECUTABLES {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR and make sure it is on PATH."
    ))
}

/// Finds a tessdata directory containing `eng.traineddata`.
///
/// `TESSDATA_PREFIX` wins when set (with or without a trailing `tessdata`
/// component), then the common system locations are checked.
pub fn find_tessdata_dir() -> Result<PathBuf> {
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&prefix);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
        let p = PathBuf::from(&prefix).join("tessdata");
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    for path in COMMON_TESSDATA {
        let p = PathBuf::from(path);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "tessdata directory not found. Ensure eng.traineddata is installed \
         or set TESSDATA_PREFIX."
    ))
}
