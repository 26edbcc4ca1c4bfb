use std::path::Path;
use std::time::Duration;
use xcloc::{OpenOptions, find_bundles_with};

pub fn run_find_command(dir: &str, timeout_ms: Option<u64>) -> Result<(), String> {
    let root = Path::new(dir);
    if !root.is_dir() {
        return Err(format!("{} is not a directory", dir));
    }
    let options = OpenOptions::new().with_scan_timeout(timeout_ms.map(Duration::from_millis));

    let bundles = find_bundles_with(root, &options);
    for bundle in &bundles {
        println!("{}", bundle.display());
    }
    eprintln!("Found {} bundle(s)", bundles.len());
    Ok(())
}
