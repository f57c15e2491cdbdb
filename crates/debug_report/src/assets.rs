//! Embedded report assets.
//!
//! The LaTeX template, preamble and styles, the pandoc Lua filter and the
//! markdown templates are baked into the binary, so `report-init` and
//! `report-build` work without any installed support files.

use std::path::{Path, PathBuf};

use crate::{ReportError, Result};

/// Placeholder in the document template replaced by the converted body.
pub const BODY_PLACEHOLDER: &str = "%%MD_BODY%%";
pub const PACKAGE_PLACEHOLDER: &str = "<package>";
pub const DATE_PLACEHOLDER: &str = "<YYYY-MM-DD>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetGroup {
    Tex,
    Lua,
    Markdown,
}

#[derive(Debug, Clone, Copy)]
pub struct Asset {
    pub group: AssetGroup,
    pub name: &'static str,
    pub contents: &'static str,
}

macro_rules! embedded_assets {
    ($($group:ident, $dir:literal / $name:literal => $const_name:ident),* $(,)?) => {
        $(
            pub const $const_name: &str =
                include_str!(concat!("../templates/", $dir, "/", $name));
        )*

        pub const ASSETS: &[Asset] = &[
            $( Asset { group: AssetGroup::$group, name: $name, contents: $const_name }, )*
        ];
    };
}

embedded_assets! {
    Tex, "tex" / "debug_report_template_md.tex" => DOCUMENT_TEMPLATE,
    Tex, "tex" / "debug_report_preamble.tex" => PREAMBLE,
    Tex, "tex" / "styles.tex" => STYLES,
    Lua, "lua" / "minted.lua" => MINTED_FILTER,
    Markdown, "md" / "99_checklist.md" => CHECKLIST,
    Markdown, "md" / "frag_hypothesis.md" => FRAG_HYPOTHESIS,
    Markdown, "md" / "frag_trace.md" => FRAG_TRACE,
    Markdown, "md" / "frag_evidence.md" => FRAG_EVIDENCE,
    Markdown, "md" / "frag_conclusion.md" => FRAG_CONCLUSION,
}

pub const PREAMBLE_FILE: &str = "debug_report_preamble.tex";
pub const STYLES_FILE: &str = "styles.tex";

pub fn find(name: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|a| a.name == name)
}

/// Writes every asset of the given groups into `dest` (flat), overwriting.
pub fn install(dest: &Path, groups: &[AssetGroup]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dest).map_err(|e| ReportError::io("mkdir", dest, e))?;

    let mut written = Vec::new();
    for asset in ASSETS.iter().filter(|a| groups.contains(&a.group)) {
        let out = dest.join(asset.name);
        std::fs::write(&out, asset.contents).map_err(|e| ReportError::io("write", &out, e))?;
        tracing::debug!("installed {}", out.display());
        written.push(out);
    }
    Ok(written)
}

/// `~/.local/share/delve-debug`.
pub fn install_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".local").join("share").join("delve-debug"))
}

/// Copies the preamble and styles into `dir` so the compiler always sees the
/// versions this binary was built with.
pub fn ensure_compile_assets(dir: &Path) -> Result<()> {
    for (name, contents) in [(PREAMBLE_FILE, PREAMBLE), (STYLES_FILE, STYLES)] {
        let dest = dir.join(name);
        std::fs::write(&dest, contents).map_err(|e| ReportError::io("write", &dest, e))?;
    }
    Ok(())
}
