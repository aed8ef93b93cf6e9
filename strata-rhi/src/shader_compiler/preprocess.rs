use crate::{RhiResult, RhiShaderStageFlags};
use fnv::FnvHashSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// An entry point declared in the source with `#pragma <stage> <name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RhiShaderEntryPoint {
    pub stage: RhiShaderStageFlags,
    pub name: String,
}

impl RhiShaderEntryPoint {
    pub fn new(
        stage: RhiShaderStageFlags,
        name: impl Into<String>,
    ) -> Self {
        RhiShaderEntryPoint {
            stage,
            name: name.into(),
        }
    }
}

/// Source with every directive resolved, ready for the compiler
#[derive(Debug, Clone)]
pub struct RhiPreprocessedShader {
    pub name: String,
    pub source: String,
    /// Entry points declared with pragmas, in declaration order
    pub entry_points: Vec<RhiShaderEntryPoint>,
    /// Every file that contributed to `source`, the root file first. Used to decide if a reload
    /// is needed.
    pub files: Vec<PathBuf>,
}

/// Parses the stage name used in `#pragma <stage> <entry point>`
pub fn parse_stage_name(name: &str) -> Option<RhiShaderStageFlags> {
    Some(match name {
        "vertex" => RhiShaderStageFlags::VERTEX,
        "fragment" | "pixel" => RhiShaderStageFlags::FRAGMENT,
        "geometry" => RhiShaderStageFlags::GEOMETRY,
        "compute" => RhiShaderStageFlags::COMPUTE,
        "tessellation" | "hull" | "tess_control" => RhiShaderStageFlags::TESSELLATION_CONTROL,
        "domain" | "tess_eval" => RhiShaderStageFlags::TESSELLATION_EVALUATION,
        "raygen" | "ray_generation" => RhiShaderStageFlags::RAYGEN,
        "mesh" => RhiShaderStageFlags::MESH,
        "task" | "amplification" => RhiShaderStageFlags::TASK,
        _ => return None,
    })
}

/// Resolves `#include "relative/path"`, `#define KEY VALUE` and `#pragma <stage> <entry>` lines.
///
/// Includes are resolved relative to the including file first, then against the configured
/// include directories. A file is pasted at most once; including a file from itself (directly or
/// through other files) is an error. Defines substitute whole identifiers only, and apply from the
/// line after the define onward. Defines passed to the preprocessor apply everywhere.
#[derive(Debug, Clone, Default)]
pub struct RhiShaderPreprocessor {
    include_dirs: Vec<PathBuf>,
    defines: BTreeMap<String, String>,
}

struct PreprocessState {
    defines: BTreeMap<String, String>,
    entry_points: Vec<RhiShaderEntryPoint>,
    files: Vec<PathBuf>,
    include_stack: Vec<PathBuf>,
    included: FnvHashSet<PathBuf>,
    output: String,
}

impl RhiShaderPreprocessor {
    pub fn new(
        include_dirs: Vec<PathBuf>,
        defines: BTreeMap<String, String>,
    ) -> Self {
        RhiShaderPreprocessor {
            include_dirs,
            defines,
        }
    }

    pub fn add_include_dir<P: Into<PathBuf>>(
        &mut self,
        include_dir: P,
    ) {
        self.include_dirs.push(include_dir.into());
    }

    pub fn remove_include_dir(
        &mut self,
        include_dir: &Path,
    ) {
        self.include_dirs.retain(|x| x != include_dir);
    }

    pub fn add_define(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        self.defines.insert(key.into(), value.into());
    }

    pub fn preprocess_file(
        &self,
        path: &Path,
    ) -> RhiResult<RhiPreprocessedShader> {
        let path = canonicalize(path)?;
        let name = path
            .file_name()
            .map(|x| x.to_string_lossy().to_string())
            .unwrap_or_default();
        log::debug!("Preprocessing shader {:?}", path);

        let mut state = self.new_state();
        self.process_file(&path, &mut state)?;

        Ok(RhiPreprocessedShader {
            name,
            source: state.output,
            entry_points: state.entry_points,
            files: state.files,
        })
    }

    /// Preprocess source that is not on disk. Includes resolve against `base_dir` (if given), then
    /// the include directories.
    pub fn preprocess_str(
        &self,
        name: &str,
        source: &str,
        base_dir: Option<&Path>,
    ) -> RhiResult<RhiPreprocessedShader> {
        let mut state = self.new_state();
        self.process_source(name, source, base_dir, &mut state)?;

        Ok(RhiPreprocessedShader {
            name: name.to_string(),
            source: state.output,
            entry_points: state.entry_points,
            files: state.files,
        })
    }

    fn new_state(&self) -> PreprocessState {
        PreprocessState {
            defines: self.defines.clone(),
            entry_points: Vec::default(),
            files: Vec::default(),
            include_stack: Vec::default(),
            included: Default::default(),
            output: String::default(),
        }
    }

    fn process_file(
        &self,
        path: &Path,
        state: &mut PreprocessState,
    ) -> RhiResult<()> {
        if state.include_stack.iter().any(|x| x == path) {
            let chain: Vec<_> = state
                .include_stack
                .iter()
                .map(|x| x.display().to_string())
                .collect();
            Err(format!(
                "{} includes itself (through {})",
                path.display(),
                chain.join(" -> ")
            ))?;
        }

        if !state.included.insert(path.to_path_buf()) {
            log::trace!("Skipping {:?}, already included", path);
            return Ok(());
        }

        let source = std::fs::read_to_string(path).map_err(|e| {
            crate::RhiError::StringError(format!("could not read {}: {}", path.display(), e))
        })?;

        state.files.push(path.to_path_buf());
        state.include_stack.push(path.to_path_buf());
        let name = path.display().to_string();
        let result = self.process_source(&name, &source, path.parent(), state);
        state.include_stack.pop();
        result
    }

    fn process_source(
        &self,
        name: &str,
        source: &str,
        base_dir: Option<&Path>,
        state: &mut PreprocessState,
    ) -> RhiResult<()> {
        for (line_index, line) in source.lines().enumerate() {
            let line_number = line_index + 1;
            let trimmed = line.trim_start();
            if !trimmed.starts_with('#') {
                let substituted = substitute_defines(line, &state.defines);
                state.output.push_str(&substituted);
                state.output.push('\n');
                continue;
            }

            let mut parts = trimmed[1..].trim_start().splitn(2, char::is_whitespace);
            let directive = parts.next().unwrap_or("");
            let rest = parts.next().unwrap_or("").trim();

            match directive {
                "include" => {
                    let relative = parse_include_path(rest).ok_or_else(|| {
                        format!(
                            "{}:{}: expected #include \"relative/path\", found {:?}",
                            name, line_number, trimmed
                        )
                    })?;
                    let resolved = self.resolve_include(relative, base_dir).ok_or_else(|| {
                        format!(
                            "{}:{}: could not find included file {:?}",
                            name, line_number, relative
                        )
                    })?;
                    self.process_file(&resolved, state)?;
                }
                "define" => {
                    let mut define_parts = rest.splitn(2, char::is_whitespace);
                    let key = define_parts.next().unwrap_or("");
                    if !is_identifier(key) {
                        Err(format!(
                            "{}:{}: #define needs an identifier, found {:?}",
                            name, line_number, key
                        ))?;
                    }
                    let value = define_parts.next().unwrap_or("").trim();
                    let value = substitute_defines(value, &state.defines);
                    state.defines.insert(key.to_string(), value);
                }
                "pragma" => {
                    let mut pragma_parts = rest.split_whitespace();
                    let stage_name = pragma_parts.next().unwrap_or("");
                    let entry_point = pragma_parts.next();
                    match (parse_stage_name(stage_name), entry_point) {
                        (Some(stage), Some(entry_point)) => {
                            if state.entry_points.iter().any(|x| x.stage == stage) {
                                Err(format!(
                                    "{}:{}: stage {} is declared more than once",
                                    name, line_number, stage_name
                                ))?;
                            }
                            state
                                .entry_points
                                .push(RhiShaderEntryPoint::new(stage, entry_point));
                        }
                        (Some(_), None) => Err(format!(
                            "{}:{}: #pragma {} needs an entry point name",
                            name, line_number, stage_name
                        ))?,
                        (None, _) => {
                            log::warn!(
                                "{}:{}: ignoring unknown pragma {:?}",
                                name,
                                line_number,
                                rest
                            );
                        }
                    }
                }
                _ => Err(format!(
                    "{}:{}: unknown preprocessor directive #{}",
                    name, line_number, directive
                ))?,
            }

            // Keep line numbers of compiler diagnostics pointing at the right line
            state.output.push('\n');
        }

        Ok(())
    }

    fn resolve_include(
        &self,
        relative: &str,
        base_dir: Option<&Path>,
    ) -> Option<PathBuf> {
        base_dir
            .into_iter()
            .chain(self.include_dirs.iter().map(|x| x.as_path()))
            .map(|dir| dir.join(relative))
            .find(|candidate| candidate.is_file())
            .and_then(|path| canonicalize(&path).ok())
    }
}

fn canonicalize(path: &Path) -> RhiResult<PathBuf> {
    path.canonicalize().map_err(|e| {
        crate::RhiError::StringError(format!("could not resolve {}: {}", path.display(), e))
    })
}

fn parse_include_path(rest: &str) -> Option<&str> {
    let rest = rest.trim();
    if rest.len() >= 2 && rest.starts_with('"') && rest.ends_with('"') {
        Some(&rest[1..rest.len() - 1])
    } else {
        None
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace identifiers that name a define with its value. Text inside identifiers (`MAX_LIGHTS`
/// within `MAX_LIGHTS_2`) is left alone.
fn substitute_defines(
    line: &str,
    defines: &BTreeMap<String, String>,
) -> String {
    if defines.is_empty() {
        return line.to_string();
    }

    let mut result = String::with_capacity(line.len());
    let mut identifier_start = None;
    let mut previous_is_word_char = false;
    for (i, c) in line.char_indices() {
        let is_word_char = c.is_ascii_alphanumeric() || c == '_';
        match identifier_start {
            Some(start) if !is_word_char => {
                push_identifier(&mut result, &line[start..i], defines);
                identifier_start = None;
                result.push(c);
            }
            Some(_) => {}
            // An identifier can't begin inside a word, so the `u` of `2u` is never substituted
            None if is_word_char && !c.is_ascii_digit() && !previous_is_word_char => {
                identifier_start = Some(i)
            }
            None => result.push(c),
        }
        previous_is_word_char = is_word_char;
    }

    if let Some(start) = identifier_start {
        push_identifier(&mut result, &line[start..], defines);
    }

    result
}

fn push_identifier(
    result: &mut String,
    identifier: &str,
    defines: &BTreeMap<String, String>,
) {
    match defines.get(identifier) {
        Some(value) => result.push_str(value),
        None => result.push_str(identifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn substitutes_whole_identifiers() {
        let mut defines = BTreeMap::default();
        defines.insert("COUNT".to_string(), "4u".to_string());
        assert_eq!(
            substitute_defines("array<f32, COUNT> COUNTER COUNT;", &defines),
            "array<f32, 4u> COUNTER 4u;"
        );
        assert_eq!(substitute_defines("COUNT", &defines), "4u");
    }

    #[test]
    fn collects_pragmas_and_defines() {
        let preprocessor = RhiShaderPreprocessor::default();
        let shader = preprocessor
            .preprocess_str(
                "inline",
                "#pragma vertex vs_main\n#pragma fragment fs_main\n#define SCALE 2.0\nlet x = SCALE;\n",
                None,
            )
            .unwrap();

        assert_eq!(
            shader.entry_points,
            vec![
                RhiShaderEntryPoint::new(RhiShaderStageFlags::VERTEX, "vs_main"),
                RhiShaderEntryPoint::new(RhiShaderStageFlags::FRAGMENT, "fs_main"),
            ]
        );
        // Directive lines become blank lines
        assert_eq!(shader.source, "\n\n\nlet x = 2.0;\n");
    }

    #[test]
    fn define_from_config_applies_everywhere() {
        let mut preprocessor = RhiShaderPreprocessor::default();
        preprocessor.add_define("MAX_LIGHTS", "16");
        let shader = preprocessor
            .preprocess_str("inline", "const N: u32 = MAX_LIGHTS;", None)
            .unwrap();
        assert_eq!(shader.source, "const N: u32 = 16;\n");
    }

    #[test]
    fn rejects_bad_directives() {
        let preprocessor = RhiShaderPreprocessor::default();
        assert!(preprocessor
            .preprocess_str("a", "#include <angle.wgsl>", None)
            .is_err());
        assert!(preprocessor.preprocess_str("a", "#ifdef X", None).is_err());
        assert!(preprocessor
            .preprocess_str("a", "#pragma vertex", None)
            .is_err());
        assert!(preprocessor
            .preprocess_str("a", "#pragma vertex a\n#pragma vertex b", None)
            .is_err());
        assert!(preprocessor
            .preprocess_str("a", "#include \"missing.wgsl\"", None)
            .is_err());
    }

    #[test]
    fn resolves_includes_relative_to_including_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("lib")).unwrap();
        fs::write(
            dir.path().join("main.wgsl"),
            "#include \"lib/common.wgsl\"\nfn main_fn() {}\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("lib/common.wgsl"),
            "#include \"consts.wgsl\"\nfn common_fn() {}\n",
        )
        .unwrap();
        fs::write(dir.path().join("lib/consts.wgsl"), "const PI: f32 = 3.14;\n").unwrap();

        let shader = RhiShaderPreprocessor::default()
            .preprocess_file(&dir.path().join("main.wgsl"))
            .unwrap();

        let pi = shader.source.find("const PI").unwrap();
        let common = shader.source.find("fn common_fn").unwrap();
        let main = shader.source.find("fn main_fn").unwrap();
        assert!(pi < common && common < main);
        assert_eq!(shader.files.len(), 3);
    }

    #[test]
    fn detects_include_cycles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.wgsl"), "#include \"b.wgsl\"\n").unwrap();
        fs::write(dir.path().join("b.wgsl"), "#include \"a.wgsl\"\n").unwrap();

        let result = RhiShaderPreprocessor::default().preprocess_file(&dir.path().join("a.wgsl"));
        assert!(result.is_err());
    }

    #[test]
    fn falls_back_to_include_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("shared.wgsl"), "const K: f32 = 1.0;\n").unwrap();

        let preprocessor =
            RhiShaderPreprocessor::new(vec![dir.path().to_path_buf()], Default::default());
        let shader = preprocessor
            .preprocess_str("inline", "#include \"shared.wgsl\"", None)
            .unwrap();
        assert!(shader.source.contains("const K"));
    }
}
