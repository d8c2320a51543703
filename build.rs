use std::{env, fs, path::PathBuf};

fn main() {
    built::write_built_file()
        .expect("Failed to acquire build-time information");

    // Put the linker script somewhere the linker can find it.
    let out = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    fs::write(out.join("memory.x"), include_bytes!("memory.x")).unwrap();
    println!("cargo:rustc-link-search={}", out.display());
    println!("cargo:rerun-if-changed=memory.x");
}
