use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Default)]
struct ConfigSection {
    page_size: Option<usize>,
    emulated_pages: Option<usize>,
}

#[derive(Deserialize, Default)]
struct Config {
    #[serde(default)]
    config: ConfigSection,
}

struct ResolvedConfig {
    page_size: usize,
    page_shift: u32,
    emulated_pages: usize,
}

fn resolve_config(cfg: &ConfigSection) -> ResolvedConfig {
    let page_size = cfg.page_size.unwrap_or(65536);
    assert!(
        page_size > 0 && page_size.is_power_of_two(),
        "page_size ({}) must be a power of 2",
        page_size
    );
    assert!(
        page_size >= 4096,
        "page_size ({}) must be >= 4096",
        page_size
    );

    let emulated_pages = cfg.emulated_pages.unwrap_or(2048);
    assert!(emulated_pages > 0, "emulated_pages must be > 0");

    ResolvedConfig {
        page_size,
        page_shift: page_size.trailing_zeros(),
        emulated_pages,
    }
}

fn default_config_path() -> String {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    format!("{}/linmem.toml", manifest_dir)
}

fn generate_config(cfg: &ResolvedConfig, out_path: &Path) {
    let code = format!(
        "// Auto-generated by build.rs. Do not edit.\n\n\
         pub const PAGE_SHIFT: usize = {};\n\
         pub const PAGE_SIZE: usize = {};\n\
         pub const EMULATED_PAGES: usize = {};\n",
        cfg.page_shift, cfg.page_size, cfg.emulated_pages,
    );
    fs::write(out_path, code).expect("failed to write config_gen.rs");
}

fn main() {
    println!("cargo:rerun-if-env-changed=LINMEM_CONFIG");

    let out_dir = env::var("OUT_DIR").unwrap();

    let config_path = env::var("LINMEM_CONFIG").unwrap_or_else(|_| default_config_path());
    println!("cargo:rerun-if-changed={}", config_path);
    let content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", config_path, e));

    let config: Config = toml::from_str(&content).expect("failed to parse TOML config");

    let resolved = resolve_config(&config.config);
    generate_config(&resolved, &Path::new(&out_dir).join("config_gen.rs"));
}
