fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/wing_stats.proto");

    let protoc_path = protoc_bin_vendored::protoc_bin_path()?;

    unsafe {
        std::env::set_var("PROTOC", protoc_path);
    }

    // BTreeMap keeps the encoded map ordered, so identical tables encode to identical bytes.
    prost_build::Config::new()
        .btree_map(["."])
        .compile_protos(&["proto/wing_stats.proto"], &["proto/"])?;

    Ok(())
}
