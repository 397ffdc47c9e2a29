fn main() {
    // Emits built.rs into OUT_DIR; GIT_COMMIT_HASH falls back to "unknown" outside a git checkout.
    if let Err(err) = built::write_built_file() {
        panic!("Failed to acquire build-time information: {err}");
    }
}
