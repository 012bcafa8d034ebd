fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // Pass through TICKETDESK_GIT_HASH from the container build environment
    println!("cargo:rerun-if-env-changed=TICKETDESK_GIT_HASH");
    if let Ok(hash) = std::env::var("TICKETDESK_GIT_HASH") {
        println!("cargo:rustc-env=TICKETDESK_GIT_HASH={}", hash);
    }
}
