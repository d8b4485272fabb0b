// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Gather build time info
    built::write_built_file().expect("Failed to acquire build-time information");

    // Let the linker find a hand-built libhdf5.
    #[cfg(feature = "hdf5")]
    if let Ok(lib_dir) = std::env::var("HDF5_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", lib_dir);
    }
}
