use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=BTSIFT_COMMIT");

    let commit_full = env::var("BTSIFT_COMMIT").ok().filter(|v| !v.is_empty());
    let commit_full = commit_full.or_else(|| run_git(&["rev-parse", "HEAD"]));
    let commit_full = commit_full.unwrap_or_else(|| "unknown".to_string());

    let commit_short = if commit_full == "unknown" {
        commit_full.clone()
    } else {
        commit_full.chars().take(7).collect()
    };

    let build_date =
        run_git(&["log", "-1", "--format=%cs"]).unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=BTSIFT_BUILD_COMMIT={commit_short}");
    println!("cargo:rustc-env=BTSIFT_BUILD_COMMIT_FULL={commit_full}");
    println!("cargo:rustc-env=BTSIFT_BUILD_DATE={build_date}");
}

fn run_git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}
