fn main() {
    const ICON: &str = "assets/windows/wol_hosts.ico";
    println!("cargo:rerun-if-changed={}", ICON);

    if std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default() == "windows" {
        let mut res = winresource::WindowsResource::new();
        if std::path::Path::new(ICON).exists() {
            res.set_icon(ICON);
        }
        if let Err(e) = res.compile() {
            eprintln!("Error: failed to compile Windows resources: {}", e);
            std::process::exit(1);
        }
    }
}
