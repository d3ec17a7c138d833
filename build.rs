use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // Schema changes must rebuild the binary: sqlx::migrate! embeds the files.
    println!("cargo:rerun-if-changed=migrations");

    // Dev marker so /health shows whether the running server is the newest binary.
    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=PHARMACY_LOCATOR_BUILD_ID={}", build_id);
}
