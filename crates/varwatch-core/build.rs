//! Build script for varwatch-core
//!
//! This script checks system requirements before compilation:
//! - Minimum Rust version (`core::mem::offset_of!` = Rust 1.77.0+)
//! - Target platform (the supervisor only exists on Linux x86-64)
//!
//! ## Requirements
//!
//! - **Rust**: 1.77.0 or newer
//! - **Linux x86-64**: ptrace with `PTRACE_PEEKUSER`/`PTRACE_POKEUSER` access to DR0-DR7
//! - **Other targets**: the crate still builds (resolver, encoders, dispatch loop), but
//!   there is no process supervisor

use std::env;

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");

    // offsetof(struct user, u_debugreg) is computed with core::mem::offset_of!,
    // stabilized in 1.77.0
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::new(1, 77, 0);

        if rustc_version < min_rust_version {
            panic!(
                "varwatch-core requires Rust {} or newer, found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }

    // The build script runs on the host, so look at the target through cargo's env vars
    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    if target_os != "linux" || target_arch != "x86_64" {
        println!(
            "cargo:warning=varwatch-core: process supervision is only available on linux/x86_64 (target is {target_os}/{target_arch})"
        );
    }
}
