use vergen::EmitBuilder;

fn main() {
    // optionally emit git branch and hash; ignore failures (e.g. no .git)
    let _ = EmitBuilder::builder()
        .git_branch()
        .git_sha(true)
        .fail_on_error()
        .quiet()
        .emit();
}
