// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Vspace Authors

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=proto/space_format.proto");
    prost_build::compile_protos(&["proto/space_format.proto"], &["proto"])
}
