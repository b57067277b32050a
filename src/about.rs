pub const PRIMERFORGE_DISPLAY_VERSION: &str = env!("PRIMERFORGE_DISPLAY_VERSION");
pub const PRIMERFORGE_BUILD_N: &str = env!("PRIMERFORGE_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "primerforge {}\nBuild {}\nPCR primer and hybridization probe design",
        PRIMERFORGE_DISPLAY_VERSION, PRIMERFORGE_BUILD_N
    )
}
