/// Operating system of the running binary, spelled the way Go release
/// metadata spells it.
#[must_use]
pub fn go_os() -> &'static str {
    os_name(std::env::consts::OS)
}

/// Architecture of the running binary, spelled the way Go release metadata
/// spells it.
#[must_use]
pub fn go_arch() -> &'static str {
    arch_name(std::env::consts::ARCH)
}

fn os_name(rust_os: &'static str) -> &'static str {
    match rust_os {
        "macos" => "darwin",
        other => other,
    }
}

fn arch_name(rust_arch: &'static str) -> &'static str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "loongarch64" => "loong64",
        "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
        "powerpc64" => "ppc64",
        other => other,
    }
}
