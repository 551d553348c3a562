use std::fs;
use std::path::Path;

fn main() {
    let manifest = Path::new("Cargo.toml");
    let content = fs::read_to_string(manifest).expect("Failed to read Cargo.toml");
    let cargo_toml: toml::Value = toml::from_str(&content).expect("Failed to parse Cargo.toml");

    // Launcher defaults live in [package.metadata.settings.defaults] and are
    // handed to the binary as JSON so settings.rs can deserialize them.
    let defaults = cargo_toml
        .get("package")
        .and_then(|p| p.get("metadata"))
        .and_then(|m| m.get("settings"))
        .and_then(|s| s.get("defaults"))
        .expect("Cargo.toml is missing [package.metadata.settings.defaults]");

    let defaults_json = serde_json::to_string(defaults).expect("Failed to serialize metadata");
    println!("cargo:rustc-env=LAUNCHER_DEFAULTS_JSON={}", defaults_json);

    println!("cargo:rerun-if-changed=Cargo.toml");
}
