fn main() {
    // Generates `built.rs` in OUT_DIR, included by `src/lib.rs`.
    #[allow(clippy::expect_used)]
    built::write_built_file().expect("Failed to acquire build-time information");
}
