// build.rs

use clap::{Arg, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn package_arg() -> Arg {
    Arg::new("package").required(true).help("Package name")
}

fn build_cli() -> Command {
    Command::new("gravel")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Gravel Contributors")
        .about("Host-local package manager with signed bundles and service supervision")
        .subcommand_required(true)
        .subcommand(
            Command::new("install")
                .about("Install a package (no-op if already installed)")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("upgrade")
                .about("Reinstall an installed package, firing the upgrade triggers")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("start")
                .about("Start a package's supervised service")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("stop")
                .about("Signal a package's supervised service to stop")
                .arg(package_arg()),
        )
        .subcommand(
            Command::new("restart")
                .about("Stop and start a package's supervised service")
                .arg(package_arg()),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("gravel.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
