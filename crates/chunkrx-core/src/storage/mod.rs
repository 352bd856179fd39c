//! Output file lifecycle.
//!
//! Output is written to `<output>.part`, fsynced, then atomically renamed onto
//! the output path, so a reader never sees a half-written stream under the
//! final name and an existing file is replaced only on success.

mod builder;
mod sink;
mod writer;

pub use builder::OutputFileBuilder;
pub use sink::{FileSink, Sink};
#[cfg(test)]
pub(crate) use sink::MemorySink;
pub use writer::OutputWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `out.bin` → `out.bin.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
