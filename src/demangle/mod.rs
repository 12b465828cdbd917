//! Demangler helpers for Rust and C++ (Itanium) symbol names.
//!
//! ELF toolchains only produce these two manglings, so anything else is
//! reported as unrecognised.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolFlavor {
    Rust,
    Itanium,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemangleResult {
    pub original: String,
    pub demangled: String,
    pub flavor: SymbolFlavor,
}

fn looks_itanium(s: &str) -> bool {
    s.starts_with("_Z") || s.starts_with("__Z")
}

pub fn detect_flavor(s: &str) -> SymbolFlavor {
    if rustc_demangle::try_demangle(s).is_ok() {
        return SymbolFlavor::Rust;
    }
    if looks_itanium(s) {
        return SymbolFlavor::Itanium;
    }
    SymbolFlavor::Unknown
}

/// Attempt to demangle a single symbol. Returns None when not recognized.
pub fn demangle_one(s: &str) -> Option<DemangleResult> {
    // Rust (v0 + legacy) demangler
    if let Ok(dm) = rustc_demangle::try_demangle(s) {
        // Drop the trailing hash of legacy names
        let out = format!("{:#}", dm);
        return Some(DemangleResult {
            original: s.to_string(),
            demangled: out,
            flavor: SymbolFlavor::Rust,
        });
    }
    // C++ (Itanium) demangler
    if looks_itanium(s) {
        if let Ok(sym) = cpp_demangle::Symbol::new(s) {
            let out = sym.to_string();
            return Some(DemangleResult {
                original: s.to_string(),
                demangled: out,
                flavor: SymbolFlavor::Itanium,
            });
        }
    }
    None
}
